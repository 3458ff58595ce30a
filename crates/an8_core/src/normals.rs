//! Vertex normal synthesis for meshes that do not carry normals.

use an8_math::DVec3;

use crate::mesh::{FaceFlags, Mesh};

impl Mesh {
    /// Facet normal of each face, `(c - a) x (b - a)` over its first three
    /// corners, normalized. Degenerate faces get a zero normal.
    pub fn facet_normals(&self) -> Vec<DVec3> {
        self.faces
            .iter()
            .map(|face| match face.corners.as_slice() {
                [a, b, c, ..] => {
                    let a = self.points[a.point as usize];
                    let b = self.points[b.point as usize];
                    let c = self.points[c.point as usize];
                    (c - a).cross(b - a).normalize_or_zero()
                }
                _ => DVec3::ZERO,
            })
            .collect()
    }

    /// Compute normals, replacing any the mesh already has.
    ///
    /// The normal array starts with one facet normal per face, which also
    /// becomes the face's flat-normal index. At each point, the incident
    /// faces within `smooth_angle` (or `default_angle` when the mesh has no
    /// angle of its own) of the point's first incident face share one
    /// averaged normal; the others keep their facet normal.
    pub fn compute_normals(&mut self, default_angle: f64) {
        let angle = self.smooth_angle.unwrap_or(default_angle);
        let cos_limit = angle.to_radians().cos();

        let facets = self.facet_normals();
        let mut normals = facets.clone();

        // (face, corner) pairs touching each point, in face order
        let mut incident: Vec<Vec<(usize, usize)>> = vec![Vec::new(); self.points.len()];
        for (f, face) in self.faces.iter().enumerate() {
            for (c, corner) in face.corners.iter().enumerate() {
                incident[corner.point as usize].push((f, c));
            }
        }

        for (f, face) in self.faces.iter_mut().enumerate() {
            face.flat_normal = f as i32;
            face.flags |= FaceFlags::HAS_NORMALS;
            for corner in &mut face.corners {
                corner.normal = Some(f as u32);
            }
        }

        let mut shared_count = 0usize;
        for uses in &incident {
            let Some(&(first, _)) = uses.first() else {
                continue;
            };
            let reference = facets[first];
            let group: Vec<(usize, usize)> = uses
                .iter()
                .copied()
                .filter(|(f, _)| facets[*f].dot(reference) > cos_limit)
                .collect();
            if group.is_empty() {
                continue;
            }

            let mut sum = DVec3::ZERO;
            let mut last_face = None;
            for &(f, _) in &group {
                if last_face != Some(f) {
                    sum += facets[f];
                    last_face = Some(f);
                }
            }
            normals.push(sum.normalize_or_zero());
            let index = (normals.len() - 1) as u32;
            for (f, c) in group {
                self.faces[f].corners[c].normal = Some(index);
            }
            shared_count += 1;
        }

        log::debug!(
            "Computed {} normals ({} facet, {} smoothed) at {} degrees",
            normals.len(),
            facets.len(),
            shared_count,
            angle
        );
        self.normals = Some(normals);
    }

    /// Compute normals only when the mesh has none.
    pub fn ensure_normals(&mut self, default_angle: f64) {
        if !self.has_normals() {
            self.compute_normals(default_angle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Face;

    /// Two faces of a unit cube meeting along the edge x = 1, z = 0..1
    /// (-Y bottom and +X side), plus a coplanar neighbour of the bottom.
    fn corner_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        for p in [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 1.0),
        ] {
            mesh.push_point(p);
        }
        let quad = |points: [u32; 4]| Face::textured(0, &points, &[0, 0, 0, 0]);
        mesh.texcoords = Some(vec![Default::default()]);
        // bottom, facing -Y
        mesh.faces.push(quad([0, 3, 2, 1]));
        // side, facing +X
        mesh.faces.push(quad([1, 2, 5, 4]));
        // coplanar with the bottom
        mesh.faces.push(quad([1, 2, 7, 6]));
        mesh
    }

    #[test]
    fn test_facet_normals_follow_winding() {
        let mesh = corner_mesh();
        let facets = mesh.facet_normals();
        assert_eq!(facets[0], DVec3::NEG_Y);
        assert_eq!(facets[1], DVec3::X);
        assert_eq!(facets[2], DVec3::NEG_Y);
    }

    #[test]
    fn test_sharp_edge_keeps_facets_apart() {
        let mut mesh = corner_mesh();
        mesh.compute_normals(45.0);
        assert!(mesh.validate().is_ok());

        let normals = mesh.normals.as_ref().unwrap();
        let normal_at = |f: usize, c: usize| normals[mesh.faces[f].corners[c].normal.unwrap() as usize];

        // point 1 is shared by all three faces; bottom and its neighbour merge
        let bottom = mesh.faces[0].corners[3].normal;
        let neighbour = mesh.faces[2].corners[0].normal;
        assert_eq!(bottom, neighbour);
        assert!((normal_at(0, 3) - DVec3::NEG_Y).length() < 1e-12);

        // the side face is 90 degrees away and keeps its own facet entry
        assert_eq!(mesh.faces[1].corners[0].normal, Some(1));
        assert_eq!(normal_at(1, 0), DVec3::X);

        for (i, face) in mesh.faces.iter().enumerate() {
            assert_eq!(face.flat_normal, i as i32);
            assert!(face.flags.contains(FaceFlags::HAS_NORMALS));
        }
    }

    #[test]
    fn test_wide_angle_smooths_everything() {
        let mut mesh = corner_mesh();
        mesh.smooth_angle = Some(100.0);
        mesh.compute_normals(45.0);
        let normals = mesh.normals.as_ref().unwrap();
        let n = normals[mesh.faces[1].corners[0].normal.unwrap() as usize];
        // bottom + side + coplanar bottom, averaged once per face
        let expected = (DVec3::NEG_Y * 2.0 + DVec3::X).normalize();
        assert!((n - expected).length() < 1e-12);
        assert_eq!(mesh.faces[0].corners[3].normal, mesh.faces[1].corners[0].normal);
    }

    #[test]
    fn test_degenerate_face_gets_zero_normal() {
        let mut mesh = Mesh::new();
        for p in [DVec3::ZERO, DVec3::X, DVec3::X * 2.0] {
            mesh.push_point(p);
        }
        mesh.faces.push(Face {
            corners: (0..3).map(crate::mesh::Corner::new).collect(),
            ..Default::default()
        });
        mesh.compute_normals(45.0);
        assert_eq!(mesh.normals.as_ref().unwrap()[0], DVec3::ZERO);
        assert_eq!(mesh.faces[0].corners[0].normal, Some(0));
    }

    #[test]
    fn test_existing_normals_are_kept() {
        let mut mesh = corner_mesh();
        mesh.normals = Some(vec![DVec3::Y]);
        mesh.ensure_normals(45.0);
        assert_eq!(mesh.normals, Some(vec![DVec3::Y]));
    }
}
