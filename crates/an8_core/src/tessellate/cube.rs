use std::collections::HashMap;

use an8_math::{DVec2, DVec3};

use super::{push_quad, MIN_DIMENSION};
use crate::an8::object::Cube;
use crate::mesh::Mesh;

const MAX_DIVISIONS: i64 = 128;

/// Face table: outward axis, sign, and the in-plane axes `(u, v)` with
/// `u x v` equal to the outward normal.
const FACES: [(usize, f64, usize, usize); 6] = [
    (0, 1.0, 1, 2),
    (0, -1.0, 2, 1),
    (1, 1.0, 2, 0),
    (1, -1.0, 0, 2),
    (2, 1.0, 0, 1),
    (2, -1.0, 1, 0),
];

/// Tessellate a box centered on the origin.
///
/// Each side is a grid of `divisions` quads. Points on shared edges and
/// corners are emitted once; every side has its own texcoord grid running
/// from `(0, 0)` to `(1, 1)`.
pub fn cube(cube: &Cube) -> Mesh {
    let mut mesh = Mesh::with_material(cube.material.as_deref());

    let scale = cube.scale.to_array();
    if scale.iter().filter(|s| **s > 0.0).count() < 2 {
        log::debug!("Cube '{}' has fewer than two positive axes", cube.name);
        return mesh;
    }
    let half = scale.map(|s| s.max(MIN_DIMENSION) * 0.5);
    let divisions = cube.divisions.map(|d| d.clamp(1, MAX_DIVISIONS) as usize);

    let mut lattice: HashMap<[usize; 3], u32> = HashMap::new();

    for (axis, sign, u_axis, v_axis) in FACES {
        let (du, dv) = (divisions[u_axis], divisions[v_axis]);
        let mut point_ids = Vec::with_capacity((du + 1) * (dv + 1));
        let mut texcoord_ids = Vec::with_capacity((du + 1) * (dv + 1));

        for i in 0..=du {
            for j in 0..=dv {
                let mut key = [0usize; 3];
                key[axis] = if sign > 0.0 { divisions[axis] } else { 0 };
                key[u_axis] = i;
                key[v_axis] = j;

                let id = *lattice.entry(key).or_insert_with(|| {
                    let mut p = DVec3::ZERO;
                    for k in 0..3 {
                        let t = key[k] as f64 / divisions[k] as f64;
                        p[k] = -half[k] + 2.0 * half[k] * t;
                    }
                    mesh.push_point(p)
                });
                point_ids.push(id);
                texcoord_ids
                    .push(mesh.push_texcoord(DVec2::new(i as f64 / du as f64, j as f64 / dv as f64)));
            }
        }

        let at = |i: usize, j: usize| i * (dv + 1) + j;
        for i in 0..du {
            for j in 0..dv {
                let corners = [at(i, j), at(i, j + 1), at(i + 1, j + 1), at(i + 1, j)];
                push_quad(
                    &mut mesh,
                    corners.map(|c| point_ids[c]),
                    corners.map(|c| texcoord_ids[c]),
                );
            }
        }
    }

    log::debug!(
        "Tessellated cube '{}': {} points, {} faces",
        cube.name,
        mesh.vertex_count(),
        mesh.face_count()
    );
    mesh
}
