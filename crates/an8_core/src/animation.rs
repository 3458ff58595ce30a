//! Keyframed joint rotations sampled into per-frame bone matrices.

use std::collections::{BTreeMap, BTreeSet};

use an8_math::{DQuat, DVec3, Matrix4};
use serde::Serialize;

use crate::an8::figure::{Axis, FloatKey, Sequence};
use crate::scene::NodeId;
use crate::skin::Skeleton;

/// Interpolation written for every sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Interpolation {
    #[default]
    #[serde(rename = "LINEAR")]
    Linear,
}

impl Interpolation {
    pub fn label(self) -> &'static str {
        match self {
            Interpolation::Linear => "LINEAR",
        }
    }
}

/// Bone transform at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PoseSample {
    /// Seconds
    pub time: f64,

    pub frame: i64,

    /// Bone transform relative to its parent
    pub matrix: Matrix4,

    pub interpolation: Interpolation,
}

/// Samples targeting one joint node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Channel {
    pub target: NodeId,

    pub bone: String,

    /// Strictly increasing in time
    pub samples: Vec<PoseSample>,
}

/// One sequence in output form.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Animation {
    /// Run-unique identifier
    pub id: String,

    pub name: String,

    pub figure: String,

    pub channels: Vec<Channel>,
}

impl Animation {
    pub fn sample_count(&self) -> usize {
        self.channels.iter().map(|c| c.samples.len()).sum()
    }
}

/// Angle of one track at `frame`.
///
/// With a key on only one side of `frame` that key's value is used, as it
/// is when both neighbours are the same key. Between two distinct keys the
/// value is `(end - start) / (end frame - start frame)`, reproducing the
/// long-standing behavior of existing An8 converters rather than a lerp.
pub fn sample_track(keys: &[FloatKey], frame: i64) -> f64 {
    let before = keys.iter().rev().find(|k| k.frame <= frame);
    let after = keys.iter().find(|k| k.frame >= frame);
    match (before, after) {
        (None, None) => 0.0,
        (Some(k), None) | (None, Some(k)) => k.value,
        (Some(start), Some(end)) if start.frame == end.frame => start.value,
        (Some(start), Some(end)) => {
            (end.value - start.value) / (end.frame - start.frame) as f64
        }
    }
}

/// Rotation for per-axis angles in degrees, applied X, then Z, then Y.
pub fn joint_rotation(x: f64, y: f64, z: f64) -> DQuat {
    let qx = DQuat::from_axis_angle(DVec3::X, x.to_radians());
    let qy = DQuat::from_axis_angle(DVec3::Y, y.to_radians());
    let qz = DQuat::from_axis_angle(DVec3::Z, z.to_radians());
    qy * qz * qx
}

/// Key tracks of one bone, by axis.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoneTracks<'a> {
    pub x: Option<&'a [FloatKey]>,
    pub y: Option<&'a [FloatKey]>,
    pub z: Option<&'a [FloatKey]>,
}

impl<'a> BoneTracks<'a> {
    pub fn set(&mut self, axis: Axis, keys: &'a [FloatKey]) {
        match axis {
            Axis::X => self.x = Some(keys),
            Axis::Y => self.y = Some(keys),
            Axis::Z => self.z = Some(keys),
        }
    }

    fn tracks(&self) -> impl Iterator<Item = &'a [FloatKey]> {
        [self.x, self.y, self.z].into_iter().flatten()
    }

    /// Every distinct key frame across the three tracks, ascending.
    pub fn frames(&self) -> BTreeSet<i64> {
        self.tracks().flatten().map(|k| k.frame).collect()
    }

    /// Composed local matrix at each key frame.
    pub fn sample(&self, bind: &Matrix4) -> BTreeMap<i64, Matrix4> {
        let angle = |track: Option<&[FloatKey]>, frame| track.map_or(0.0, |k| sample_track(k, frame));
        self.frames()
            .into_iter()
            .map(|frame| {
                let rotation = joint_rotation(
                    angle(self.x, frame),
                    angle(self.y, frame),
                    angle(self.z, frame),
                );
                (frame, bind.multiply(&Matrix4::from_rotation(rotation)))
            })
            .collect()
    }
}

/// Sample a sequence against its figure's skeleton.
///
/// `joints[i]` is the scene node of `skeleton.bones[i]`. Tracks naming an
/// unknown bone or axis are reported and skipped.
pub fn sample_sequence(
    id: String,
    sequence: &Sequence,
    skeleton: &Skeleton,
    joints: &[NodeId],
    frames_per_second: f64,
    warn: &mut dyn FnMut(&str),
) -> Animation {
    debug_assert_eq!(joints.len(), skeleton.len());

    let mut tracks: BTreeMap<usize, BoneTracks> = BTreeMap::new();
    for joint_angle in &sequence.joint_angles {
        let Some(bone) = skeleton.find(&joint_angle.bone) else {
            let message = format!(
                "Sequence '{}' animates unknown bone '{}'",
                sequence.name, joint_angle.bone
            );
            log::warn!("{}", message);
            warn(&message);
            continue;
        };
        let Some(axis) = joint_angle.axis() else {
            let message = format!(
                "Sequence '{}' has unknown axis '{}' on bone '{}'",
                sequence.name, joint_angle.axis, joint_angle.bone
            );
            log::warn!("{}", message);
            warn(&message);
            continue;
        };
        tracks.entry(bone).or_default().set(axis, &joint_angle.keys);
    }

    let channels: Vec<Channel> = tracks
        .into_iter()
        .map(|(bone, bone_tracks)| {
            let pose = &skeleton.bones[bone];
            let samples = bone_tracks
                .sample(&pose.local_matrix())
                .into_iter()
                .map(|(frame, matrix)| PoseSample {
                    time: frame as f64 / frames_per_second,
                    frame,
                    matrix,
                    interpolation: Interpolation::Linear,
                })
                .collect();
            Channel {
                target: joints[bone],
                bone: pose.name.clone(),
                samples,
            }
        })
        .collect();

    log::debug!(
        "Sampled sequence '{}': {} channels at {} fps",
        sequence.name,
        channels.len(),
        frames_per_second
    );

    Animation {
        id,
        name: sequence.name.clone(),
        figure: sequence.figure.clone(),
        channels,
    }
}
