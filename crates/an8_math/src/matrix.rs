use bytemuck::{Pod, Zeroable};
use glam::{DMat4, DQuat, DVec3};
use serde::Serialize;

/// A row-major 4x4 matrix.
///
/// Rows are stored in order; an affine transform keeps its translation in the
/// last column and `[0, 0, 0, 1]` in the last row. This is the layout the
/// interchange emitters write out, so no transposition happens on export.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize)]
pub struct Matrix4 {
    pub rows: [[f64; 4]; 4],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Cofactor helper: index `offset` steps after `i`, wrapping at 4.
#[inline]
fn wrap(i: usize, offset: usize) -> usize {
    (i + offset) % 4
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { rows }
    }

    /// Build a transform from a translation, a rotation and per-axis scale.
    ///
    /// Scale is applied first, then rotation, then translation.
    pub fn from_translation_rotation_scale(p: DVec3, q: DQuat, scale: DVec3) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let r = [
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - z * w),
                2.0 * (x * z + y * w),
            ],
            [
                2.0 * (x * y + z * w),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - x * w),
            ],
            [
                2.0 * (x * z - y * w),
                2.0 * (y * z + x * w),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ];
        let s = [scale.x, scale.y, scale.z];
        let t = [p.x, p.y, p.z];

        let mut rows = Self::IDENTITY.rows;
        for row in 0..3 {
            for col in 0..3 {
                rows[row][col] = r[row][col] * s[col];
            }
            rows[row][3] = t[row];
        }
        Self { rows }
    }

    pub fn from_translation_rotation(p: DVec3, q: DQuat) -> Self {
        Self::from_translation_rotation_scale(p, q, DVec3::ONE)
    }

    pub fn from_translation(p: DVec3) -> Self {
        Self::from_translation_rotation_scale(p, DQuat::IDENTITY, DVec3::ONE)
    }

    pub fn from_rotation(q: DQuat) -> Self {
        Self::from_translation_rotation_scale(DVec3::ZERO, q, DVec3::ONE)
    }

    /// Standard matrix product `self * other`.
    pub fn multiply(&self, other: &Matrix4) -> Matrix4 {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[r][k] * other.rows[k][c]).sum();
            }
        }
        Matrix4 { rows }
    }

    /// Transform a point with an implicit homogeneous 1; only the top three
    /// rows contribute.
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        let m = &self.rows;
        DVec3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        )
    }

    pub fn translation(&self) -> DVec3 {
        DVec3::new(self.rows[0][3], self.rows[1][3], self.rows[2][3])
    }

    /// Determinant of the 3x3 minor left after removing row `r` and column `c`.
    ///
    /// The remaining rows and columns are taken in cyclic order, which is an
    /// even permutation of the sorted order, so no sign fix is needed here.
    fn minor(&self, r: usize, c: usize) -> f64 {
        let m = |i: usize, j: usize| self.rows[wrap(r, i)][wrap(c, j)];
        m(1, 1) * (m(2, 2) * m(3, 3) - m(2, 3) * m(3, 2))
            - m(1, 2) * (m(2, 1) * m(3, 3) - m(2, 3) * m(3, 1))
            + m(1, 3) * (m(2, 1) * m(3, 2) - m(2, 2) * m(3, 1))
    }

    fn cofactor(&self, r: usize, c: usize) -> f64 {
        let sign = if (r + c) % 2 == 0 { 1.0 } else { -1.0 };
        sign * self.minor(r, c)
    }

    pub fn determinant(&self) -> f64 {
        (0..4).map(|c| self.rows[0][c] * self.cofactor(0, c)).sum()
    }

    /// Inverse via the adjugate. A determinant of exactly zero yields the
    /// identity matrix.
    pub fn inverse(&self) -> Matrix4 {
        let det = self.determinant();
        if det == 0.0 {
            return Matrix4::IDENTITY;
        }
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                // adjugate is the transposed cofactor matrix
                *cell = self.cofactor(c, r) / det;
            }
        }
        Matrix4 { rows }
    }

    pub fn transpose(&self) -> Matrix4 {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = self.rows[c][r];
            }
        }
        Matrix4 { rows }
    }

    /// Flat row-major view, the order emitters write matrices in.
    pub fn as_flat(&self) -> &[f64; 16] {
        bytemuck::cast_ref(&self.rows)
    }

    pub fn approx_eq(&self, other: &Matrix4, epsilon: f64) -> bool {
        self.as_flat()
            .iter()
            .zip(other.as_flat())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl std::ops::Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        self.multiply(&rhs)
    }
}

impl From<DMat4> for Matrix4 {
    fn from(m: DMat4) -> Self {
        // glam is column-major
        Matrix4 { rows: m.to_cols_array_2d() }.transpose()
    }
}

impl From<Matrix4> for DMat4 {
    fn from(m: Matrix4) -> Self {
        DMat4::from_cols_array_2d(&m.transpose().rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EPSILON;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_trs_matches_glam() {
        let p = DVec3::new(1.0, -2.0, 3.5);
        let q = DQuat::from_axis_angle(DVec3::new(0.2, 1.0, -0.4).normalize(), 0.9);
        let s = DVec3::new(2.0, 0.5, 3.0);

        let ours = Matrix4::from_translation_rotation_scale(p, q, s);
        let glam = Matrix4::from(DMat4::from_scale_rotation_translation(s, q, p));
        assert!(ours.approx_eq(&glam, 1e-12));
        assert_eq!(ours.rows[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_transform_point() {
        let m = Matrix4::from_translation_rotation(
            DVec3::new(10.0, 0.0, 0.0),
            DQuat::from_axis_angle(DVec3::Z, FRAC_PI_2),
        );
        let p = m.transform_point(DVec3::X);
        assert!((p - DVec3::new(10.0, 1.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_multiply_order() {
        let t = Matrix4::from_translation(DVec3::new(0.0, 5.0, 0.0));
        let r = Matrix4::from_rotation(DQuat::from_axis_angle(DVec3::Z, FRAC_PI_2));
        // rotate first, then translate
        let p = (t * r).transform_point(DVec3::X);
        assert!((p - DVec3::new(0.0, 6.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let m = Matrix4::from_rows([
            [2.0, 0.5, 1.0, 3.0],
            [0.0, 1.5, -1.0, 2.0],
            [1.0, 0.0, 3.0, -4.0],
            [0.5, 0.25, 0.0, 1.0],
        ]);
        let product = m.multiply(&m.inverse());
        assert!(product.approx_eq(&Matrix4::IDENTITY, EPSILON));

        let product = m.inverse().multiply(&m);
        assert!(product.approx_eq(&Matrix4::IDENTITY, EPSILON));
    }

    #[test]
    fn test_inverse_affine() {
        let m = Matrix4::from_translation_rotation_scale(
            DVec3::new(4.0, 5.0, 6.0),
            DQuat::from_axis_angle(DVec3::Y, 0.3),
            DVec3::new(1.0, 2.0, 0.5),
        );
        let expected = Matrix4::from(DMat4::from(m).inverse());
        assert!(m.inverse().approx_eq(&expected, 1e-9));
    }

    #[test]
    fn test_singular_inverse_is_identity() {
        let m = Matrix4::from_rows([
            [1.0, 2.0, 3.0, 4.0],
            [2.0, 4.0, 6.0, 8.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert_eq!(m.determinant(), 0.0);
        assert_eq!(m.inverse(), Matrix4::IDENTITY);
    }

    #[test]
    fn test_determinant() {
        let m = Matrix4::from_translation_rotation_scale(
            DVec3::ZERO,
            DQuat::IDENTITY,
            DVec3::new(2.0, 3.0, 4.0),
        );
        assert!((m.determinant() - 24.0).abs() < EPSILON);
    }

    #[test]
    fn test_flat_is_row_major() {
        let m = Matrix4::from_translation(DVec3::new(7.0, 8.0, 9.0));
        let flat = m.as_flat();
        assert_eq!(flat[3], 7.0);
        assert_eq!(flat[7], 8.0);
        assert_eq!(flat[11], 9.0);
        assert_eq!(flat[15], 1.0);
    }
}
