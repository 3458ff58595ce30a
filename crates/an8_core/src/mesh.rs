//! Polygon mesh representation shared by the parser, the tessellators and
//! the normal/weight synthesis passes.
//!
//! Unlike a GPU mesh, corners index points, normals and texcoords
//! independently, the way An8 stores them. Faces are arbitrary polygons.

use an8_math::{DVec2, DVec3};
use bitflags::bitflags;

bitflags! {
    /// Flags carried by every An8 face record.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FaceFlags: u32 {
        /// Render the back side as well
        const SHOW_BACK = 0b001;
        /// Corners carry a normal index
        const HAS_NORMALS = 0b010;
        /// Corners carry a texcoord index
        const HAS_TEXTURE = 0b100;
    }
}

/// One polygon corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Corner {
    pub point: u32,
    pub normal: Option<u32>,
    pub texcoord: Option<u32>,
}

impl Corner {
    pub fn new(point: u32) -> Self {
        Self {
            point,
            normal: None,
            texcoord: None,
        }
    }

    pub fn with_texcoord(point: u32, texcoord: u32) -> Self {
        Self {
            point,
            normal: None,
            texcoord: Some(texcoord),
        }
    }
}

/// A polygon of a mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    pub flags: FaceFlags,
    /// Index into the owning mesh's material list
    pub material: i32,
    /// Index of the facet normal, -1 when unknown
    pub flat_normal: i32,
    pub corners: Vec<Corner>,
}

impl Face {
    /// Build a textured face from parallel point and texcoord indices.
    pub fn textured(material: i32, points: &[u32], texcoords: &[u32]) -> Self {
        debug_assert_eq!(points.len(), texcoords.len());
        Self {
            flags: FaceFlags::HAS_TEXTURE,
            material,
            flat_normal: -1,
            corners: points
                .iter()
                .zip(texcoords)
                .map(|(&p, &t)| Corner::with_texcoord(p, t))
                .collect(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.corners.len()
    }
}

/// A polygon mesh with independently indexed attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub points: Vec<DVec3>,

    /// Normals, `None` until supplied by the file or synthesized
    pub normals: Option<Vec<DVec3>>,

    pub texcoords: Option<Vec<DVec2>>,

    pub faces: Vec<Face>,

    /// Material names referenced by `Face::material`
    pub materials: Vec<String>,

    /// Smoothing threshold in degrees, if the source specified one
    pub smooth_angle: Option<f64>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh with a single material slot, as produced by the tessellators.
    pub fn with_material(material: Option<&str>) -> Self {
        Self {
            materials: material.map(|m| vec![m.to_string()]).unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn has_texcoords(&self) -> bool {
        self.texcoords.is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Append a point and return its index.
    pub fn push_point(&mut self, p: DVec3) -> u32 {
        self.points.push(p);
        (self.points.len() - 1) as u32
    }

    /// Append a texcoord and return its index.
    pub fn push_texcoord(&mut self, uv: DVec2) -> u32 {
        let texcoords = self.texcoords.get_or_insert_with(Vec::new);
        texcoords.push(uv);
        (texcoords.len() - 1) as u32
    }

    /// Number of triangles a fan triangulation of every face would produce.
    pub fn triangle_count(&self) -> usize {
        self.faces
            .iter()
            .map(|f| f.point_count().saturating_sub(2))
            .sum()
    }

    /// Check the index invariants of every face.
    ///
    /// Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        let normal_count = self.normals.as_ref().map_or(0, Vec::len);
        let texcoord_count = self.texcoords.as_ref().map_or(0, Vec::len);

        for (i, face) in self.faces.iter().enumerate() {
            if self.has_normals() && !face.flags.contains(FaceFlags::HAS_NORMALS) {
                let in_range = usize::try_from(face.flat_normal).is_ok_and(|n| n < normal_count);
                if !in_range {
                    return Err(format!("face {} has bad flat normal index {}", i, face.flat_normal));
                }
            }
            for corner in &face.corners {
                if corner.point as usize >= self.points.len() {
                    return Err(format!(
                        "face {} references point {} of {}",
                        i,
                        corner.point,
                        self.points.len()
                    ));
                }
                if face.flags.contains(FaceFlags::HAS_NORMALS) {
                    match corner.normal {
                        Some(n) if (n as usize) < normal_count => {}
                        other => {
                            return Err(format!("face {} has bad normal index {:?}", i, other))
                        }
                    }
                }
                if face.flags.contains(FaceFlags::HAS_TEXTURE) {
                    match corner.texcoord {
                        Some(t) if (t as usize) < texcoord_count => {}
                        other => {
                            return Err(format!("face {} has bad texcoord index {:?}", i, other))
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let mut mesh = Mesh::with_material(Some("grey"));
        for p in [DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0), DVec3::Y] {
            mesh.push_point(p);
        }
        for uv in [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y] {
            mesh.push_texcoord(uv);
        }
        mesh.faces.push(Face::textured(0, &[0, 1, 2, 3], &[0, 1, 2, 3]));
        mesh
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.materials, vec!["grey".to_string()]);
        assert!(!mesh.has_normals());
        assert!(mesh.has_texcoords());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_validate_catches_bad_point() {
        let mut mesh = quad();
        mesh.faces[0].corners[2].point = 9;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_validate_requires_flagged_normals() {
        let mut mesh = quad();
        mesh.faces[0].flags |= FaceFlags::HAS_NORMALS;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_validate_checks_flat_normal() {
        let mut mesh = quad();
        mesh.normals = Some(vec![DVec3::Z]);
        mesh.faces[0].flat_normal = 5;
        assert!(mesh.validate().unwrap_err().contains("flat normal"));

        mesh.faces[0].flat_normal = -1;
        assert!(mesh.validate().is_err());

        mesh.faces[0].flat_normal = 0;
        assert!(mesh.validate().is_ok());
    }
}
