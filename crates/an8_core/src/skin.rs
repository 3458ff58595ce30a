//! Skeleton poses and bone weight synthesis.
//!
//! A figure's bones are flattened into a [`Skeleton`] whose absolute
//! origins and orientations come from a top-down walk. Bones attract mesh
//! vertices through their influence capsules: a segment along the bone's +Y
//! axis with inner and outer radii at each end.

use an8_math::{DQuat, DVec3, Matrix4, QuatExt};

use crate::an8::figure::{Bone, Figure, Influence};
use crate::an8::parser::WeightRecord;

/// One bone of a flattened skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct BonePose {
    pub name: String,
    pub parent: Option<usize>,
    pub length: f64,
    /// Translation relative to the parent bone's frame
    pub offset: DVec3,
    /// Rotation relative to the parent bone's frame
    pub local_orientation: DQuat,
    pub origin: DVec3,
    pub orientation: DQuat,
    pub influence: Option<Influence>,
}

impl BonePose {
    /// Bind transform relative to the parent bone.
    pub fn local_matrix(&self) -> Matrix4 {
        Matrix4::from_translation_rotation(self.offset, self.local_orientation)
    }

    /// Absolute bind transform.
    pub fn matrix(&self) -> Matrix4 {
        Matrix4::from_translation_rotation(self.origin, self.orientation)
    }

    /// Express a figure-space point in this bone's frame.
    pub fn to_bone_space(&self, p: DVec3) -> DVec3 {
        self.orientation.conjugate().rotate_vector(p - self.origin)
    }

    /// Influence of this bone on a figure-space point, in `[0, 1]`.
    ///
    /// The point is projected onto the segment between the two influence
    /// centers. Inside the inner radius the weight is 1, beyond the outer
    /// radius 0, linear in between. Radii are interpolated along the
    /// segment and held at the end values past either end.
    pub fn influence_weight(&self, p: DVec3) -> f64 {
        let Some(influence) = self.influence else {
            return 0.0;
        };
        let local = self.to_bone_space(p);

        let mut ends = [
            (influence.center0 * self.length, influence.inner_radius0, influence.outer_radius0),
            (influence.center1 * self.length, influence.inner_radius1, influence.outer_radius1),
        ];
        if ends[0].0 > ends[1].0 {
            ends.swap(0, 1);
        }
        let [(y0, inner0, outer0), (y1, inner1, outer1)] = ends;

        let y = local.y.clamp(y0, y1);
        let t = if y1 > y0 { (y - y0) / (y1 - y0) } else { 0.0 };
        let inner = inner0 + (inner1 - inner0) * t;
        let outer = outer0 + (outer1 - outer0) * t;

        let distance = local.distance(DVec3::new(0.0, y, 0.0));
        if distance <= inner {
            1.0
        } else if distance >= outer {
            0.0
        } else {
            (outer - distance) / (outer - inner)
        }
    }
}

/// A figure's bones in depth-first order, parents before children.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    pub bones: Vec<BonePose>,
}

impl Skeleton {
    /// Flatten a figure and compute absolute bone frames.
    ///
    /// A child sits at the tip of its parent, `(0, parent length, 0)` in the
    /// parent's frame. Children of a top-level bone sit at its origin: the
    /// root's own length is ignored.
    pub fn from_figure(figure: &Figure) -> Self {
        let mut bones: Vec<BonePose> = Vec::new();
        let mut stack: Vec<(&Bone, Option<usize>)> =
            figure.bones.iter().rev().map(|b| (b, None)).collect();

        while let Some((bone, parent)) = stack.pop() {
            let (offset, origin, orientation) = match parent {
                None => (DVec3::ZERO, DVec3::ZERO, bone.orientation),
                Some(p) => {
                    let parent_pose = &bones[p];
                    let offset = if parent_pose.parent.is_none() {
                        DVec3::ZERO
                    } else {
                        DVec3::new(0.0, parent_pose.length, 0.0)
                    };
                    let origin = parent_pose.origin + parent_pose.orientation.rotate_vector(offset);
                    let orientation = (parent_pose.orientation * bone.orientation).normalize();
                    (offset, origin, orientation)
                }
            };

            let index = bones.len();
            bones.push(BonePose {
                name: bone.name.clone(),
                parent,
                length: bone.length,
                offset,
                local_orientation: bone.orientation,
                origin,
                orientation,
                influence: bone.influence,
            });
            stack.extend(bone.bones.iter().rev().map(|b| (b, Some(index))));
        }

        log::debug!("Skeleton '{}': {} bones", figure.name, bones.len());
        Self { bones }
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Resolve a `weightedby` list against this skeleton.
    ///
    /// Unknown names are reported and dropped; the surviving bones keep
    /// their relative order.
    pub fn bind(&self, weighted_by: &[String], warn: &mut dyn FnMut(&str)) -> SkinBinding {
        let mut joints = Vec::with_capacity(weighted_by.len());
        let mut remap = Vec::with_capacity(weighted_by.len());
        for name in weighted_by {
            match self.find(name) {
                Some(bone) => {
                    remap.push(Some(joints.len() as u32));
                    joints.push(bone);
                }
                None => {
                    let message = format!("Bone '{}' in weightedby list not found", name);
                    log::warn!("{}", message);
                    warn(&message);
                    remap.push(None);
                }
            }
        }
        SkinBinding { joints, remap }
    }
}

/// The bones a mesh is weighted by, in weight-index order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinBinding {
    /// Skeleton indices; weight record bone indices point into this list
    pub joints: Vec<usize>,
    /// Position in the original `weightedby` list to position in `joints`
    remap: Vec<Option<u32>>,
}

impl SkinBinding {
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Re-index weight records read from the file onto `joints`, dropping
    /// entries for bones that did not resolve.
    pub fn remap_records(&self, records: &[WeightRecord]) -> Vec<WeightRecord> {
        records
            .iter()
            .map(|record| {
                let mut remapped: WeightRecord = record
                    .iter()
                    .filter_map(|&(bone, weight)| {
                        let joint = self.remap.get(bone as usize).copied().flatten()?;
                        Some((joint, weight))
                    })
                    .collect();
                normalize_record(&mut remapped);
                remapped
            })
            .collect()
    }

    /// Compute weights for figure-space vertex positions.
    pub fn compute_weights(&self, skeleton: &Skeleton, points: &[DVec3]) -> Vec<WeightRecord> {
        points
            .iter()
            .map(|&p| {
                let mut record: WeightRecord = self
                    .joints
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &bone)| {
                        let weight = skeleton.bones[bone].influence_weight(p);
                        (weight > 0.0).then_some((i as u32, weight))
                    })
                    .collect();
                normalize_record(&mut record);
                record
            })
            .collect()
    }
}

/// Scale a record's weights to sum to one. Empty records stay empty.
pub fn normalize_record(record: &mut WeightRecord) {
    let total: f64 = record.iter().map(|(_, w)| w).sum();
    if total > 0.0 {
        for (_, weight) in record.iter_mut() {
            *weight /= total;
        }
    } else {
        record.clear();
    }
}

/// Place mesh points in figure space: mesh base, then the named object's
/// base, then the attachment bone's absolute frame.
pub fn place_points(points: &[DVec3], placement: &[Matrix4]) -> Vec<DVec3> {
    let transform = placement
        .iter()
        .fold(Matrix4::IDENTITY, |acc, m| m.multiply(&acc));
    points.iter().map(|&p| transform.transform_point(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn capsule() -> Influence {
        Influence {
            center0: 0.0,
            inner_radius0: 0.5,
            outer_radius0: 1.5,
            center1: 1.0,
            inner_radius1: 0.5,
            outer_radius1: 1.5,
        }
    }

    fn bone(name: &str, length: f64, orientation: DQuat, children: Vec<Bone>) -> Bone {
        Bone {
            name: name.into(),
            length,
            orientation,
            influence: Some(capsule()),
            bones: children,
            ..Default::default()
        }
    }

    /// root (length 5, ignored) -> upper (length 2, bent 90 degrees about Z)
    /// -> lower (length 1)
    fn figure() -> Figure {
        let lower = bone("lower", 1.0, DQuat::IDENTITY, vec![]);
        let upper = bone("upper", 2.0, DQuat::from_rotation_z(FRAC_PI_2), vec![lower]);
        let sibling = bone("sibling", 1.0, DQuat::IDENTITY, vec![]);
        Figure {
            name: "fig".into(),
            bones: vec![bone("root", 5.0, DQuat::IDENTITY, vec![upper, sibling])],
            ..Default::default()
        }
    }

    #[test]
    fn test_absolute_frames() {
        let skeleton = Skeleton::from_figure(&figure());
        let names: Vec<&str> = skeleton.bones.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["root", "upper", "lower", "sibling"]);

        // children of the root start at its origin
        let upper = &skeleton.bones[1];
        assert_eq!(upper.origin, DVec3::ZERO);
        assert_eq!(upper.offset, DVec3::ZERO);

        // lower sits at the tip of upper, which points along -X
        let lower = &skeleton.bones[2];
        assert_eq!(lower.parent, Some(1));
        assert!((lower.origin - DVec3::new(-2.0, 0.0, 0.0)).length() < 1e-12);
        assert!(lower
            .orientation
            .abs_diff_eq(DQuat::from_rotation_z(FRAC_PI_2), 1e-12));

        // the composed local matrices reproduce the absolute frame
        let composed = upper.local_matrix().multiply(&lower.local_matrix());
        assert!(composed.approx_eq(&lower.matrix(), 1e-12));
    }

    #[test]
    fn test_influence_falloff() {
        let skeleton = Skeleton::from_figure(&figure());
        let root = &skeleton.bones[0];
        assert_eq!(root.influence_weight(DVec3::new(0.2, 2.0, 0.0)), 1.0);
        assert_eq!(root.influence_weight(DVec3::new(2.0, 2.0, 0.0)), 0.0);
        assert!((root.influence_weight(DVec3::new(1.0, 2.0, 0.0)) - 0.5).abs() < 1e-12);
        // past the end of the segment the distance is to the end point
        assert!((root.influence_weight(DVec3::new(0.0, 6.0, 0.0)) - 0.5).abs() < 1e-12);

        let plain = BonePose {
            influence: None,
            ..root.clone()
        };
        assert_eq!(plain.influence_weight(DVec3::ZERO), 0.0);
    }

    #[test]
    fn test_bind_drops_unknown_bones() {
        let skeleton = Skeleton::from_figure(&figure());
        let mut warnings = Vec::new();
        let mut sink = |w: &str| warnings.push(w.to_string());
        let names = ["lower".to_string(), "ghost".to_string(), "root".to_string()];
        let binding = skeleton.bind(&names, &mut sink);

        assert_eq!(binding.joints, vec![2, 0]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ghost"));

        let records = vec![vec![(0, 0.5), (1, 0.25), (2, 0.25)], vec![(1, 1.0)]];
        let remapped = binding.remap_records(&records);
        assert_eq!(remapped[0].len(), 2);
        assert_eq!(remapped[0][0].0, 0);
        assert_eq!(remapped[0][1].0, 1);
        assert!((remapped[0][0].1 - 2.0 / 3.0).abs() < 1e-12);
        assert!(remapped[1].is_empty());
    }

    #[test]
    fn test_computed_weights_sum_to_one() {
        let skeleton = Skeleton::from_figure(&figure());
        let names: Vec<String> = ["root", "upper", "lower"].map(String::from).to_vec();
        let mut sink = |_: &str| {};
        let binding = skeleton.bind(&names, &mut sink);

        let points = [
            DVec3::new(0.0, 0.5, 0.0),
            DVec3::new(-1.0, 0.7, 0.0),
            DVec3::new(-2.5, 0.2, 0.0),
            DVec3::new(40.0, 40.0, 40.0),
        ];
        let weights = binding.compute_weights(&skeleton, &points);
        assert_eq!(weights.len(), 4);
        for record in &weights[..3] {
            assert!(!record.is_empty());
            let total: f64 = record.iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-6);
        }
        assert!(weights[3].is_empty());
    }

    #[test]
    fn test_place_points_order() {
        let mesh_base = Matrix4::from_translation(DVec3::X);
        let bone = Matrix4::from_rotation(DQuat::from_rotation_z(FRAC_PI_2));
        let placed = place_points(&[DVec3::ZERO], &[mesh_base, bone]);
        assert!((placed[0] - DVec3::Y).length() < 1e-12);
    }
}
