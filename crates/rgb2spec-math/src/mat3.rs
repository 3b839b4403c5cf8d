//! 3x3 matrix for linear color space transforms.
//!
//! [`Mat3`] carries the RGB↔XYZ gamut matrices. Row-major storage,
//! column-vector convention:
//!
//! ```text
//! | m00 m01 m02 |   | r |   | X |
//! | m10 m11 m12 | * | g | = | Y |
//! | m20 m21 m22 |   | b |   | Z |
//! ```

use crate::Vec3;
use std::ops::{Index, Mul};

/// A 3x3 f32 matrix in row-major order.
///
/// # Example
///
/// ```rust
/// use rgb2spec_math::{Mat3, Vec3};
///
/// let m = Mat3::from_rows([
///     [0.4124564, 0.3575761, 0.1804375],
///     [0.2126729, 0.7151522, 0.0721750],
///     [0.0193339, 0.1191920, 0.9503041],
/// ]);
/// let xyz = m * Vec3::new(1.0, 0.0, 0.0);
/// assert!((xyz.x - 0.4124564).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat3 {
    /// Matrix elements in row-major order: [row0, row1, row2]
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Creates a matrix from row arrays.
    #[inline]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { m: rows }
    }

    /// Returns a row as Vec3.
    #[inline]
    pub fn row(&self, i: usize) -> Vec3 {
        Vec3::from_array(self.m[i])
    }

    /// Returns a column as Vec3.
    #[inline]
    pub fn col(&self, i: usize) -> Vec3 {
        Vec3::new(self.m[0][i], self.m[1][i], self.m[2][i])
    }

    /// Returns the transpose of this matrix.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_rows([
            [self.m[0][0], self.m[1][0], self.m[2][0]],
            [self.m[0][1], self.m[1][1], self.m[2][1]],
            [self.m[0][2], self.m[1][2], self.m[2][2]],
        ])
    }

    /// Transforms a column vector by this matrix.
    ///
    /// Equivalent to `matrix * vector`.
    #[inline]
    pub fn transform(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.row(0).dot(v),
            self.row(1).dot(v),
            self.row(2).dot(v),
        )
    }

    /// Transforms by the transpose without materializing it.
    ///
    /// This is the adjoint applied in gradient back-propagation: if
    /// `y = M x`, then `dL/dx = Mᵀ (dL/dy)`.
    #[inline]
    pub fn transform_transpose(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.col(0).dot(v),
            self.col(1).dot(v),
            self.col(2).dot(v),
        )
    }

    /// Converts to glam's f64 matrix (column-major) for derivation work.
    #[inline]
    pub fn to_dmat3(&self) -> glam::DMat3 {
        glam::DMat3::from_cols(
            self.col(0).to_dvec3(),
            self.col(1).to_dvec3(),
            self.col(2).to_dvec3(),
        )
    }

    /// Creates from glam's f64 matrix, narrowing to f32.
    #[inline]
    pub fn from_dmat3(m: glam::DMat3) -> Self {
        Self::from_rows([
            [m.x_axis.x as f32, m.y_axis.x as f32, m.z_axis.x as f32],
            [m.x_axis.y as f32, m.y_axis.y as f32, m.z_axis.y as f32],
            [m.x_axis.z as f32, m.y_axis.z as f32, m.z_axis.z as f32],
        ])
    }

    /// Returns true if all elements are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.m.iter().flatten().all(|x| x.is_finite())
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        self.transform(rhs)
    }
}

impl Mul for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let mut out = Self::IDENTITY;
        for i in 0..3 {
            for j in 0..3 {
                out.m[i][j] = self.row(i).dot(rhs.col(j));
            }
        }
        out
    }
}

impl Index<usize> for Mat3 {
    type Output = [f32; 3];

    #[inline]
    fn index(&self, i: usize) -> &[f32; 3] {
        &self.m[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mat3_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Mat3::IDENTITY * v, v);
    }

    #[test]
    fn test_mat3_transpose() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let t = m.transpose();
        assert_eq!(t.m[0][1], 4.0);
        assert_eq!(t.m[1][0], 2.0);
    }

    #[test]
    fn test_mat3_transform_transpose() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let v = Vec3::new(1.0, -1.0, 2.0);
        assert_eq!(m.transform_transpose(v), m.transpose() * v);
    }

    #[test]
    fn test_mat3_mul_mat() {
        let m = Mat3::from_rows([[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]]);
        let product = m * Mat3::IDENTITY;
        assert_eq!(product, m);
    }

    #[test]
    fn test_mat3_dmat3_roundtrip() {
        let m = Mat3::from_rows([
            [0.4124564, 0.3575761, 0.1804375],
            [0.2126729, 0.7151522, 0.0721750],
            [0.0193339, 0.1191920, 0.9503041],
        ]);
        let back = Mat3::from_dmat3(m.to_dmat3());
        for i in 0..3 {
            for j in 0..3 {
                assert!((m.m[i][j] - back.m[i][j]).abs() < 1e-7);
            }
        }
    }
}
