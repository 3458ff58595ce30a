use std::f64::consts::TAU;

use an8_math::{DVec2, DVec3};

use super::{push_quad, MIN_DIMENSION};
use crate::an8::object::Cylinder;
use crate::mesh::{Face, Mesh};

const MIN_LONGITUDE: i64 = 3;
const MAX_LONGITUDE: i64 = 128;
const MIN_LATITUDE: i64 = 1;
const MAX_LATITUDE: i64 = 100;

/// Tessellate a cylinder or cone standing on the origin along +Y.
///
/// `latitude` bands run from the base ring at `y = 0` to the top ring at
/// `y = length`, interpolating the radius. A ring whose radius is zero
/// collapses to a single apex point. Caps are triangle fans, emitted only
/// when requested and when the matching end has a positive radius.
pub fn cylinder(cylinder: &Cylinder) -> Mesh {
    let mut mesh = Mesh::with_material(cylinder.material.as_deref());

    let base_radius = cylinder.diameter.max(0.0) * 0.5;
    let top_radius = cylinder.top_diameter().max(0.0) * 0.5;
    if base_radius <= 0.0 && top_radius <= 0.0 {
        log::debug!("Cylinder '{}' has no positive diameter", cylinder.name);
        return mesh;
    }

    let length = cylinder.length.max(MIN_DIMENSION);
    let longitude = cylinder
        .longlat
        .longitude
        .clamp(MIN_LONGITUDE, MAX_LONGITUDE) as usize;
    let latitude = cylinder.longlat.latitude.clamp(MIN_LATITUDE, MAX_LATITUDE) as usize;

    // rings[k][j] for j in 0..=longitude; the last entry repeats the first
    // point with its own texcoord
    let mut rings: Vec<Vec<(u32, u32)>> = Vec::with_capacity(latitude + 1);
    for k in 0..=latitude {
        let t = k as f64 / latitude as f64;
        let radius = base_radius + (top_radius - base_radius) * t;
        let y = length * t;

        let mut ring = Vec::with_capacity(longitude + 1);
        if radius <= 0.0 {
            let apex = mesh.push_point(DVec3::new(0.0, y, 0.0));
            for j in 0..=longitude {
                let u = (j as f64 + 0.5) / longitude as f64;
                ring.push((apex, mesh.push_texcoord(DVec2::new(u.min(1.0), t))));
            }
        } else {
            let first = mesh.vertex_count() as u32;
            for j in 0..=longitude {
                let point = if j < longitude {
                    let theta = TAU * j as f64 / longitude as f64;
                    mesh.push_point(DVec3::new(radius * theta.cos(), y, radius * theta.sin()))
                } else {
                    first
                };
                let uv = DVec2::new(j as f64 / longitude as f64, t);
                ring.push((point, mesh.push_texcoord(uv)));
            }
        }
        rings.push(ring);
    }

    for k in 0..latitude {
        for j in 0..longitude {
            let corners = [rings[k][j], rings[k][j + 1], rings[k + 1][j + 1], rings[k + 1][j]];
            push_quad(&mut mesh, corners.map(|c| c.0), corners.map(|c| c.1));
        }
    }

    if cylinder.cap_start && base_radius > 0.0 {
        push_cap(&mut mesh, &rings[0], 0.0, base_radius, false);
    }
    if cylinder.cap_end && top_radius > 0.0 {
        push_cap(&mut mesh, &rings[latitude], length, top_radius, true);
    }

    log::debug!(
        "Tessellated cylinder '{}': {} points, {} faces",
        cylinder.name,
        mesh.vertex_count(),
        mesh.face_count()
    );
    mesh
}

/// Fan around a new center point, facing +Y when `top` and -Y otherwise.
fn push_cap(mesh: &mut Mesh, ring: &[(u32, u32)], y: f64, radius: f64, top: bool) {
    let center = mesh.push_point(DVec3::new(0.0, y, 0.0));
    let center_uv = mesh.push_texcoord(DVec2::splat(0.5));

    let longitude = ring.len() - 1;
    let rim: Vec<u32> = (0..longitude)
        .map(|j| {
            let p = mesh.points[ring[j].0 as usize];
            let uv = DVec2::new(p.x, p.z) / (2.0 * radius) + 0.5;
            mesh.push_texcoord(uv)
        })
        .collect();

    for j in 0..longitude {
        let next = (j + 1) % longitude;
        let (a, b) = (ring[j].0, ring[next].0);
        let face = if top {
            Face::textured(0, &[center, a, b], &[center_uv, rim[j], rim[next]])
        } else {
            Face::textured(0, &[center, b, a], &[center_uv, rim[next], rim[j]])
        };
        mesh.faces.push(face);
    }
}
