//! Output geometry: flattened, emitter-ready polygon lists.

use std::collections::BTreeMap;

use an8_math::{DVec2, DVec3};
use serde::Serialize;

use crate::mesh::Mesh;

/// Per-corner index streams, in the order they are interleaved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Semantic {
    Vertex,
    Normal,
    TexCoord,
}

/// Polygons sharing one material.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PolygonGroup {
    /// Material name, `None` when the face's material index is unresolved
    pub material: Option<String>,

    /// Streams present per corner, in interleave order
    pub inputs: Vec<Semantic>,

    /// Corner count of each polygon
    pub vertex_counts: Vec<u32>,

    /// `inputs.len()` indices per corner
    pub indices: Vec<u32>,
}

impl PolygonGroup {
    pub fn polygon_count(&self) -> usize {
        self.vertex_counts.len()
    }

    pub fn stride(&self) -> usize {
        self.inputs.len()
    }
}

/// A mesh in output form.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Geometry {
    /// Run-unique identifier
    pub id: String,

    pub name: String,

    pub points: Vec<DVec3>,

    pub normals: Vec<DVec3>,

    pub texcoords: Vec<DVec2>,

    pub groups: Vec<PolygonGroup>,
}

impl Geometry {
    /// Flatten a mesh, grouping its faces by material index.
    ///
    /// Every corner carries a point index, then a normal index when the
    /// mesh has normals, then a texcoord index when it has texcoords. A
    /// corner without its own normal uses the face's flat normal; a corner
    /// without a texcoord uses texcoord 0.
    pub fn from_mesh(id: String, name: impl Into<String>, mesh: &Mesh) -> Self {
        let mut inputs = vec![Semantic::Vertex];
        if mesh.has_normals() {
            inputs.push(Semantic::Normal);
        }
        if mesh.has_texcoords() {
            inputs.push(Semantic::TexCoord);
        }

        let mut groups: BTreeMap<i32, PolygonGroup> = BTreeMap::new();
        for face in &mesh.faces {
            let group = groups.entry(face.material).or_insert_with(|| PolygonGroup {
                material: usize::try_from(face.material)
                    .ok()
                    .and_then(|m| mesh.materials.get(m))
                    .cloned(),
                inputs: inputs.clone(),
                ..Default::default()
            });

            group.vertex_counts.push(face.corners.len() as u32);
            for corner in &face.corners {
                group.indices.push(corner.point);
                if mesh.has_normals() {
                    let fallback = u32::try_from(face.flat_normal).unwrap_or(0);
                    group.indices.push(corner.normal.unwrap_or(fallback));
                }
                if mesh.has_texcoords() {
                    group.indices.push(corner.texcoord.unwrap_or(0));
                }
            }
        }

        Self {
            id,
            name: name.into(),
            points: mesh.points.clone(),
            normals: mesh.normals.clone().unwrap_or_default(),
            texcoords: mesh.texcoords.clone().unwrap_or_default(),
            groups: groups.into_values().collect(),
        }
    }

    pub fn polygon_count(&self) -> usize {
        self.groups.iter().map(PolygonGroup::polygon_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Corner, Face, FaceFlags};

    fn two_material_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        for p in [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::ONE] {
            mesh.push_point(p);
        }
        mesh.texcoords = Some(vec![DVec2::ZERO, DVec2::X, DVec2::Y]);
        mesh.materials = vec!["red".into(), "blue".into()];
        mesh.faces.push(Face::textured(1, &[0, 1, 2], &[0, 1, 2]));
        mesh.faces.push(Face {
            flags: FaceFlags::empty(),
            material: 0,
            flat_normal: -1,
            corners: vec![Corner::new(1), Corner::new(3), Corner::new(2)],
        });
        mesh.faces.push(Face::textured(1, &[2, 1, 3], &[2, 1, 0]));
        mesh
    }

    #[test]
    fn test_groups_by_material() {
        let geometry = Geometry::from_mesh("g".into(), "mesh", &two_material_mesh());
        assert_eq!(geometry.groups.len(), 2);
        assert_eq!(geometry.polygon_count(), 3);

        let red = &geometry.groups[0];
        assert_eq!(red.material.as_deref(), Some("red"));
        assert_eq!(red.inputs, vec![Semantic::Vertex, Semantic::TexCoord]);
        // untextured face falls back to texcoord 0
        assert_eq!(red.indices, vec![1, 0, 3, 0, 2, 0]);

        let blue = &geometry.groups[1];
        assert_eq!(blue.material.as_deref(), Some("blue"));
        assert_eq!(blue.vertex_counts, vec![3, 3]);
        assert_eq!(blue.indices.len(), 2 * 3 * blue.stride());
    }

    #[test]
    fn test_normals_stream() {
        let mut mesh = two_material_mesh();
        mesh.compute_normals(45.0);
        let geometry = Geometry::from_mesh("g".into(), "mesh", &mesh);
        assert_eq!(
            geometry.groups[0].inputs,
            vec![Semantic::Vertex, Semantic::Normal, Semantic::TexCoord]
        );
        assert_eq!(geometry.groups[0].indices.len(), 3 * 3);
        assert!(geometry.normals.len() >= 3);
    }

    #[test]
    fn test_unknown_material_index() {
        let mut mesh = two_material_mesh();
        mesh.faces[0].material = 7;
        let geometry = Geometry::from_mesh("g".into(), "mesh", &mesh);
        assert!(geometry.groups.iter().any(|g| g.material.is_none()));
    }
}
