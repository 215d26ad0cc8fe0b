//! 3x3 matrices, mainly for 2D transforms and normal math.

use std::ops::Mul;

/// Column-major 3x3 matrix over a flat `[f32; 9]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3 {
    pub elements: [f32; 9],
}

impl Matrix3 {
    pub const IDENTITY: Self = Self {
        elements: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub const fn from_cols_array(elements: [f32; 9]) -> Self {
        Self { elements }
    }

    /// 2D rotation by `angle` radians around the origin.
    pub fn from_rotation(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols_array([c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0])
    }

    /// 2D translation by `(x, y)`.
    pub fn from_translation(x: f32, y: f32) -> Self {
        Self::from_cols_array([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, x, y, 1.0])
    }

    /// 2D scale by `(x, y)`.
    pub fn from_scale(x: f32, y: f32) -> Self {
        Self::from_cols_array([x, 0.0, 0.0, 0.0, y, 0.0, 0.0, 0.0, 1.0])
    }

    pub fn scale(self, s: f32) -> Self {
        let mut out = self.elements;
        for e in &mut out {
            *e *= s;
        }
        Self::from_cols_array(out)
    }

    pub fn transpose(self) -> Self {
        let e = &self.elements;
        Self::from_cols_array([e[0], e[3], e[6], e[1], e[4], e[7], e[2], e[5], e[8]])
    }

    pub fn determinant(&self) -> f32 {
        let e = &self.elements;
        e[0] * (e[4] * e[8] - e[5] * e[7]) - e[3] * (e[1] * e[8] - e[2] * e[7])
            + e[6] * (e[1] * e[5] - e[2] * e[4])
    }

    /// Adjugate inverse. `None` when the determinant is zero.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 {
            return None;
        }
        let inv = 1.0 / det;
        let e = &self.elements;
        Some(Self::from_cols_array([
            (e[4] * e[8] - e[5] * e[7]) * inv,
            (e[2] * e[7] - e[1] * e[8]) * inv,
            (e[1] * e[5] - e[2] * e[4]) * inv,
            (e[5] * e[6] - e[3] * e[8]) * inv,
            (e[0] * e[8] - e[2] * e[6]) * inv,
            (e[2] * e[3] - e[0] * e[5]) * inv,
            (e[3] * e[7] - e[4] * e[6]) * inv,
            (e[1] * e[6] - e[0] * e[7]) * inv,
            (e[0] * e[4] - e[1] * e[3]) * inv,
        ]))
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = &self.elements;
        let b = &rhs.elements;
        let mut out = [0.0; 9];
        for c in 0..3 {
            for r in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    sum += a[k * 3 + r] * b[c * 3 + k];
                }
                out[c * 3 + r] = sum;
            }
        }
        Self::from_cols_array(out)
    }
}
