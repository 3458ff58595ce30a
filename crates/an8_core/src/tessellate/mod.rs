//! Procedural meshes for the An8 primitive components.
//!
//! Every generator returns a [`Mesh`] with points, texcoords and faces
//! (`HAS_TEXTURE` set, no normals). Faces wind so that `(c - a) x (b - a)`
//! points away from the solid. Degenerate parameters yield an empty mesh
//! rather than an error.

mod cube;
mod cylinder;
mod sphere;

pub use cube::cube;
pub use cylinder::cylinder;
pub use sphere::{geodesic_sphere, longlat_sphere, sphere};

use crate::mesh::{Face, Mesh};

/// Smallest extent a clamped dimension may take.
pub const MIN_DIMENSION: f64 = 1e-4;

/// Append one quad of a `(rows x columns)` strip, dropping corners that
/// collapse onto the same point.
///
/// Corners are given in `(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)`
/// order, with `i` running along the surface's "up" direction and `j` along
/// its "around" direction.
fn push_quad(mesh: &mut Mesh, points: [u32; 4], texcoords: [u32; 4]) {
    let mut p = Vec::with_capacity(4);
    let mut t = Vec::with_capacity(4);
    for (k, &point) in points.iter().enumerate() {
        if p.last() != Some(&point) && (k < 3 || p.first() != Some(&point)) {
            p.push(point);
            t.push(texcoords[k]);
        }
    }
    if p.len() >= 3 {
        mesh.faces.push(Face::textured(0, &p, &t));
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use an8_math::DVec3;

    #[test]
    fn test_push_quad_drops_collapsed_corners() {
        let mut mesh = Mesh::new();
        for p in [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z] {
            mesh.push_point(p);
        }
        push_quad(&mut mesh, [0, 1, 2, 3], [0, 1, 2, 3]);
        push_quad(&mut mesh, [0, 0, 2, 3], [0, 1, 2, 3]);
        push_quad(&mut mesh, [0, 1, 2, 0], [0, 1, 2, 3]);
        push_quad(&mut mesh, [0, 0, 0, 0], [0, 1, 2, 3]);

        assert_eq!(mesh.faces.len(), 3);
        assert_eq!(mesh.faces[0].point_count(), 4);
        assert_eq!(mesh.faces[1].point_count(), 3);
        assert_eq!(mesh.faces[1].corners[1].texcoord, Some(2));
        assert_eq!(mesh.faces[2].point_count(), 3);
    }
}
