//! Figure (skeleton) and sequence (animation) chunks.

use an8_math::DQuat;

use super::object::NamedObject;
use super::schema::{Chunk, Field, ValueKind};
use super::types::Material;

/// `figure { "name" material* bone* }`
#[derive(Clone, Debug, Default)]
pub struct Figure {
    pub name: String,
    pub materials: Vec<Material>,
    /// Root bones, usually exactly one
    pub bones: Vec<Bone>,
}

impl Chunk for Figure {
    const NAME: &'static str = "figure";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("name", ValueKind::Str, |f, v| f.name = v.into_string()),
        Field::nested("material", |f, p| {
            f.materials.push(p.chunk()?);
            Ok(())
        }),
        Field::nested("bone", |f, p| {
            f.bones.push(p.chunk()?);
            Ok(())
        }),
    ];
}

impl Figure {
    /// Visit every bone depth-first, parents before children.
    pub fn walk_bones(&self) -> impl Iterator<Item = &Bone> {
        let mut stack: Vec<&Bone> = self.bones.iter().rev().collect();
        std::iter::from_fn(move || {
            let bone = stack.pop()?;
            stack.extend(bone.bones.iter().rev());
            Some(bone)
        })
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.walk_bones().find(|b| b.name == name)
    }
}

/// Region of a bone that attracts vertices.
///
/// Centers are fractions of the bone length along +Y; radii are absolute.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Influence {
    pub center0: f64,
    pub inner_radius0: f64,
    pub outer_radius0: f64,
    pub center1: f64,
    pub inner_radius1: f64,
    pub outer_radius1: f64,
}

impl Chunk for Influence {
    const NAME: &'static str = "influence";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("center0", ValueKind::Float, |i, v| i.center0 = v.as_float()),
        Field::positional("inradius0", ValueKind::Float, |i, v| {
            i.inner_radius0 = v.as_float()
        }),
        Field::positional("outradius0", ValueKind::Float, |i, v| {
            i.outer_radius0 = v.as_float()
        }),
        Field::positional("center1", ValueKind::Float, |i, v| i.center1 = v.as_float()),
        Field::positional("inradius1", ValueKind::Float, |i, v| {
            i.inner_radius1 = v.as_float()
        }),
        Field::positional("outradius1", ValueKind::Float, |i, v| {
            i.outer_radius1 = v.as_float()
        }),
    ];
}

#[derive(Clone, Debug, Default)]
pub struct Bone {
    pub name: String,
    pub length: f64,
    pub diameter: Option<f64>,
    /// Rotation relative to the parent bone
    pub orientation: DQuat,
    pub influence: Option<Influence>,
    pub locked: bool,
    pub bones: Vec<Bone>,
    pub named_objects: Vec<NamedObject>,
}

impl Chunk for Bone {
    const NAME: &'static str = "bone";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("name", ValueKind::Str, |b, v| b.name = v.into_string()),
        Field::wrapped("length", ValueKind::Float, |b, v| b.length = v.as_float()),
        Field::wrapped("diameter", ValueKind::Float, |b, v| b.diameter = Some(v.as_float())),
        Field::wrapped("orientation", ValueKind::Quat, |b, v| {
            b.orientation = v.as_quat()
        }),
        Field::nested("influence", |b, p| {
            b.influence = Some(p.chunk()?);
            Ok(())
        }),
        Field::marker("locked", |b| b.locked = true),
        Field::ignored("dof"),
        Field::nested("bone", |b, p| {
            b.bones.push(p.chunk()?);
            Ok(())
        }),
        Field::nested("namedobject", |b, p| {
            b.named_objects.push(p.chunk()?);
            Ok(())
        }),
    ];

    fn finish(&mut self) {
        self.orientation = self.orientation.normalize();
    }
}

/// `sequence { "name" figure { "fig" } frames { n } jointangle* }`
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    pub name: String,
    pub figure: String,
    pub frames: i64,
    pub joint_angles: Vec<JointAngle>,
}

impl Chunk for Sequence {
    const NAME: &'static str = "sequence";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("name", ValueKind::Str, |s, v| s.name = v.into_string()),
        Field::wrapped("figure", ValueKind::Str, |s, v| s.figure = v.into_string()),
        Field::wrapped("frames", ValueKind::Int, |s, v| s.frames = v.as_int()),
        Field::nested("jointangle", |s, p| {
            s.joint_angles.push(p.chunk()?);
            Ok(())
        }),
    ];
}

/// Rotation axis of a joint angle track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "X" | "x" => Some(Axis::X),
            "Y" | "y" => Some(Axis::Y),
            "Z" | "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

/// `jointangle { "bone" "axis" track { floatkey* } }`
#[derive(Clone, Debug, Default)]
pub struct JointAngle {
    pub bone: String,
    pub axis: String,
    pub keys: Vec<FloatKey>,
}

impl Chunk for JointAngle {
    const NAME: &'static str = "jointangle";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("bone", ValueKind::Str, |j, v| j.bone = v.into_string()),
        Field::positional("axis", ValueKind::Str, |j, v| j.axis = v.into_string()),
        Field::nested("track", |j, p| {
            let track: Track = p.chunk()?;
            j.keys = track.keys;
            Ok(())
        }),
    ];

    fn finish(&mut self) {
        self.keys.sort_by_key(|k| k.frame);
    }
}

impl JointAngle {
    pub fn axis(&self) -> Option<Axis> {
        Axis::parse(&self.axis)
    }
}

#[derive(Clone, Debug, Default)]
struct Track {
    keys: Vec<FloatKey>,
}

impl Chunk for Track {
    const NAME: &'static str = "track";
    const FIELDS: &'static [Field<Self>] = &[
        Field::nested("floatkey", |t, p| {
            t.keys.push(p.chunk()?);
            Ok(())
        }),
        Field::ignored("pointkey"),
        Field::ignored("qkey"),
        Field::ignored("booleankey"),
    ];
}

/// One keyframe of a float track. Values are degrees for joint angles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FloatKey {
    pub frame: i64,
    pub value: f64,
    /// Interpolation hint, `"S"` for smooth or `"C"` for corner
    pub modifier: String,
}

impl Chunk for FloatKey {
    const NAME: &'static str = "floatkey";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("frame", ValueKind::Int, |k, v| k.frame = v.as_int()),
        Field::positional("value", ValueKind::Float, |k, v| k.value = v.as_float()),
        Field::positional("modifier", ValueKind::Str, |k, v| k.modifier = v.into_string()),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::an8::parser::parse_an8;
    use crate::config::DEFAULT_MAX_DEPTH;

    const RIG: &str = r#"
figure { "walker"
  material { "skin" surface { rgb { 200 150 120 } } }
  bone { "root"
    length { 3 }
    bone { "hip"
      length { 2 }
      diameter { 0.4 }
      orientation { (0 0 0.7071068 0.7071068) }
      influence { 0.25 0.5 1 0.75 0.5 1 }
      dof { "X" -90 0 90 }
      locked { }
      bone { "knee" length { 1.5 } }
      namedobject { "leg" name { "leg1" } weightedby { "hip" } }
    }
  }
}
sequence { "walk"
  figure { "walker" }
  frames { 20 }
  jointangle { "hip" "X"
    track {
      floatkey { 10 45 "S" }
      floatkey { 0 0 "C" }
    }
  }
  jointangle { "knee" "Z" track { floatkey { 5 -30 "S" } } }
}
"#;

    #[test]
    fn test_figure_hierarchy() {
        let mut sink = |w: &str| panic!("unexpected warning: {}", w);
        let doc = parse_an8(RIG, DEFAULT_MAX_DEPTH, &mut sink).unwrap();
        let figure = doc.figure("walker").unwrap();
        assert_eq!(figure.materials[0].name, "skin");

        let names: Vec<&str> = figure.walk_bones().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["root", "hip", "knee"]);

        let hip = figure.bone("hip").unwrap();
        assert_eq!(hip.length, 2.0);
        assert!(hip.locked);
        assert!((hip.orientation.length() - 1.0).abs() < 1e-12);
        let influence = hip.influence.unwrap();
        assert_eq!(influence.center1, 0.75);
        assert_eq!(influence.outer_radius0, 1.0);
        assert_eq!(hip.named_objects[0].name, "leg1");
        assert_eq!(hip.named_objects[0].weighted_by, vec!["hip"]);

        assert!(figure.bone("root").unwrap().influence.is_none());
    }

    #[test]
    fn test_sequence_keys_are_sorted() {
        let mut sink = |_: &str| {};
        let doc = parse_an8(RIG, DEFAULT_MAX_DEPTH, &mut sink).unwrap();
        let sequence = &doc.sequences[0];
        assert_eq!(sequence.name, "walk");
        assert_eq!(sequence.figure, "walker");
        assert_eq!(sequence.frames, 20);

        let hip = &sequence.joint_angles[0];
        assert_eq!(hip.axis(), Some(Axis::X));
        assert_eq!(hip.keys[0].frame, 0);
        assert_eq!(hip.keys[1].value, 45.0);
        assert_eq!(hip.keys[1].modifier, "S");
        assert_eq!(sequence.joint_angles[1].axis(), Some(Axis::Z));
    }
}
