use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use an8_math::{DVec2, DVec3};

use super::push_quad;
use crate::an8::object::{LongLat, Sphere, SphereKind};
use crate::mesh::{Face, Mesh};

const MAX_LONGITUDE: i64 = 32;
const MAX_LATITUDE: i64 = 16;
const MAX_GEODESIC: i64 = 32;

/// Tessellate a sphere component with the strategy it asks for.
pub fn sphere(sphere: &Sphere) -> Mesh {
    let material = sphere.material.as_deref();
    let mesh = match sphere.kind {
        SphereKind::LongLat(longlat) => longlat_sphere(sphere.diameter, longlat, material),
        SphereKind::Geodesic(frequency) => geodesic_sphere(sphere.diameter, frequency, material),
    };
    log::debug!(
        "Tessellated sphere '{}': {} points, {} faces",
        sphere.name,
        mesh.vertex_count(),
        mesh.face_count()
    );
    mesh
}

/// Latitude/longitude sphere centered on the origin with its poles on Y.
///
/// Produces `longitude * (latitude - 1) + 2` points: `latitude - 1` rings
/// plus the two poles. Bands between rings are quads, the pole caps are
/// triangle fans.
pub fn longlat_sphere(diameter: f64, longlat: LongLat, material: Option<&str>) -> Mesh {
    let mut mesh = Mesh::with_material(material);
    if diameter <= 0.0 || longlat.longitude <= 1 || longlat.latitude <= 1 {
        return mesh;
    }

    let radius = diameter * 0.5;
    let n = longlat.longitude.min(MAX_LONGITUDE) as usize;
    let m = longlat.latitude.min(MAX_LATITUDE) as usize;

    let bottom = mesh.push_point(DVec3::new(0.0, -radius, 0.0));
    let mut rings: Vec<Vec<(u32, u32)>> = Vec::with_capacity(m + 1);
    rings.push(pole_ring(&mut mesh, bottom, n, 0.0));

    for k in 1..m {
        let phi = PI * k as f64 / m as f64;
        let (y, rho) = (-radius * phi.cos(), radius * phi.sin());
        let v = k as f64 / m as f64;

        let first = mesh.vertex_count() as u32;
        let ring = (0..=n)
            .map(|j| {
                let point = if j < n {
                    let theta = TAU * j as f64 / n as f64;
                    mesh.push_point(DVec3::new(rho * theta.cos(), y, rho * theta.sin()))
                } else {
                    first
                };
                (point, mesh.push_texcoord(DVec2::new(j as f64 / n as f64, v)))
            })
            .collect();
        rings.push(ring);
    }

    let top = mesh.push_point(DVec3::new(0.0, radius, 0.0));
    rings.push(pole_ring(&mut mesh, top, n, 1.0));

    for k in 0..m {
        for j in 0..n {
            let corners = [rings[k][j], rings[k][j + 1], rings[k + 1][j + 1], rings[k + 1][j]];
            push_quad(&mut mesh, corners.map(|c| c.0), corners.map(|c| c.1));
        }
    }
    mesh
}

/// A ring that has collapsed onto a pole: one point, one texcoord per
/// segment centered on it.
fn pole_ring(mesh: &mut Mesh, pole: u32, n: usize, v: f64) -> Vec<(u32, u32)> {
    (0..=n)
        .map(|j| {
            let u = ((j as f64 + 0.5) / n as f64).min(1.0);
            (pole, mesh.push_texcoord(DVec2::new(u, v)))
        })
        .collect()
}

/// Geodesic sphere from a subdivided octahedron.
///
/// Each octant triangle is split at `frequency` into `frequency^2`
/// triangles whose vertices are pushed onto the sphere. Vertices on
/// octant edges are shared, giving `4 f^2 + 2` points and `8 f^2` faces.
pub fn geodesic_sphere(diameter: f64, frequency: i64, material: Option<&str>) -> Mesh {
    let mut mesh = Mesh::with_material(material);
    if diameter <= 0.0 || frequency <= 0 {
        return mesh;
    }

    let radius = diameter * 0.5;
    let s = frequency.min(MAX_GEODESIC) as i32;

    let mut lattice: HashMap<[i32; 3], u32> = HashMap::new();
    let mut seam_texcoords: HashMap<(u32, bool), u32> = HashMap::new();

    for octant in 0..8 {
        let sign = |bit: i32| if octant & bit == 0 { 1 } else { -1 };
        let (sx, sy, sz) = (sign(1), sign(2), sign(4));
        let x = [sx, 0, 0];
        let y = [0, sy, 0];
        let z = [0, 0, sz];
        let [a, b, c] = if sx * sy * sz > 0 { [x, z, y] } else { [x, y, z] };

        let mut vertex = |i: i32, j: i32| -> u32 {
            let key: [i32; 3] =
                std::array::from_fn(|k| a[k] * (s - i - j) + b[k] * i + c[k] * j);
            *lattice.entry(key).or_insert_with(|| {
                let p = DVec3::new(key[0] as f64, key[1] as f64, key[2] as f64);
                mesh.push_point(p.normalize() * radius)
            })
        };

        let mut triangles = Vec::with_capacity((s * s) as usize);
        for i in 0..s {
            for j in 0..(s - i) {
                triangles.push([vertex(i, j), vertex(i + 1, j), vertex(i, j + 1)]);
                if i + j < s - 1 {
                    triangles.push([vertex(i + 1, j), vertex(i + 1, j + 1), vertex(i, j + 1)]);
                }
            }
        }

        for points in triangles {
            let texcoords = geodesic_texcoords(&mut mesh, &mut seam_texcoords, points, radius);
            mesh.faces.push(Face::textured(0, &points, &texcoords));
        }
    }
    mesh
}

/// Azimuth/height projection of one triangle.
///
/// Triangles straddling the seam have their low `u` values shifted by one,
/// and pole corners take the mean `u` of the other corners. Both get their
/// own texcoord entries.
fn geodesic_texcoords(
    mesh: &mut Mesh,
    shared: &mut HashMap<(u32, bool), u32>,
    points: [u32; 3],
    radius: f64,
) -> [u32; 3] {
    let positions = points.map(|p| mesh.points[p as usize] / radius);
    let is_pole = positions.map(|p| p.x.abs() < 1e-9 && p.z.abs() < 1e-9);
    let mut u = positions.map(|p| ((-p.z).atan2(p.x) + PI) / TAU);
    let v = positions.map(|p| (p.y + 1.0) * 0.5);

    let body: Vec<f64> = (0..3).filter(|k| !is_pole[*k]).map(|k| u[k]).collect();
    let min = body.iter().copied().fold(f64::INFINITY, f64::min);
    let max = body.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let wrapped = max - min > 0.5;

    let mut shifted = [false; 3];
    if wrapped {
        for k in 0..3 {
            if !is_pole[k] && u[k] < 0.5 {
                u[k] += 1.0;
                shifted[k] = true;
            }
        }
    }

    let pole_u = if body.is_empty() {
        0.5
    } else {
        (0..3).filter(|k| !is_pole[*k]).map(|k| u[k]).sum::<f64>() / body.len() as f64
    };

    std::array::from_fn(|k| {
        if is_pole[k] {
            mesh.push_texcoord(DVec2::new(pole_u, v[k]))
        } else {
            let uv = DVec2::new(u[k], v[k]);
            *shared
                .entry((points[k], shifted[k]))
                .or_insert_with(|| mesh.push_texcoord(uv))
        }
    })
}
