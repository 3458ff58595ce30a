// Quaternion helpers for DQuat
//
// glam already covers normalize, conjugate, Hamilton product (`*`) and
// axis-angle construction. The extras here are the forms the skinning and
// animation code are written against.

use glam::{DQuat, DVec3};

/// Extension trait for DQuat used by the bone and animation code.
pub trait QuatExt {
    /// Rotate a vector with the expanded form of `q * v * q^-1`.
    ///
    /// Expects a unit quaternion, like every orientation in an An8 file.
    fn rotate_vector(&self, v: DVec3) -> DVec3;

    /// Rotation taking the direction of `origin` onto the direction of `target`.
    ///
    /// The axis is the normalized cross product and the angle is the arc
    /// cosine of the normalized dot product. Parallel inputs have no defined
    /// axis and yield the identity.
    fn from_arc(origin: DVec3, target: DVec3) -> DQuat;
}

impl QuatExt for DQuat {
    fn rotate_vector(&self, v: DVec3) -> DVec3 {
        let u = DVec3::new(self.x, self.y, self.z);
        let w = self.w;
        let uv = u.cross(v);
        let uuv = u.cross(uv);
        v + (uv * w + uuv) * 2.0
    }

    fn from_arc(origin: DVec3, target: DVec3) -> DQuat {
        let a = origin.normalize();
        let b = target.normalize();
        let axis = a.cross(b);
        let len = axis.length();
        if len == 0.0 || !len.is_finite() {
            return DQuat::IDENTITY;
        }
        let angle = a.dot(b).clamp(-1.0, 1.0).acos();
        DQuat::from_axis_angle(axis / len, angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_vector_matches_glam() {
        let q = DQuat::from_axis_angle(DVec3::new(1.0, 2.0, 0.5).normalize(), 0.7);
        let v = DVec3::new(0.3, -1.2, 4.0);
        let expected = q * v;
        assert!((q.rotate_vector(v) - expected).length() < 1e-9);
    }

    #[test]
    fn test_rotate_vector_quarter_turn() {
        let q = DQuat::from_axis_angle(DVec3::Z, FRAC_PI_2);
        let r = q.rotate_vector(DVec3::X);
        assert!((r - DVec3::Y).length() < 1e-9);
    }

    #[test]
    fn test_conjugate_undoes_rotation() {
        let q = DQuat::from_axis_angle(DVec3::Y, 1.1);
        let v = DVec3::new(1.0, 2.0, 3.0);
        let back = q.conjugate().rotate_vector(q.rotate_vector(v));
        assert!((back - v).length() < 1e-9);
    }

    #[test]
    fn test_from_arc() {
        let q = DQuat::from_arc(DVec3::X, DVec3::new(0.0, 3.0, 0.0));
        assert!((q.rotate_vector(DVec3::X) - DVec3::Y).length() < 1e-9);
    }

    #[test]
    fn test_from_arc_parallel_is_identity() {
        let q = DQuat::from_arc(DVec3::X, DVec3::X * 2.0);
        assert_eq!(q, DQuat::IDENTITY);
    }
}
