//! 4x4 transform and projection matrices.

use std::ops::Mul;

use super::{Euler, Vector3, Vector4};

/// Column-major 4x4 matrix over a flat `[f32; 16]`.
///
/// The layout matches GPU upload order: basis columns first, translation
/// at elements 12..14. Vectors are columns, so transforms compose as
/// `v' = M * v` and `(A * B)` applies `B` first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4 {
    pub elements: [f32; 16],
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        elements: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const fn from_cols_array(elements: [f32; 16]) -> Self {
        Self { elements }
    }

    pub fn from_translation(t: Vector3) -> Self {
        let mut m = Self::IDENTITY;
        m.elements[12] = t.x;
        m.elements[13] = t.y;
        m.elements[14] = t.z;
        m
    }

    pub fn from_nonuniform_scale(s: Vector3) -> Self {
        let mut m = Self::IDENTITY;
        m.elements[0] = s.x;
        m.elements[5] = s.y;
        m.elements[10] = s.z;
        m
    }

    /// Rotation matrix for the fixed composition order: X first, then Y,
    /// then Z (`R = Rz * Ry * Rx`).
    pub fn from_euler(e: Euler) -> Self {
        let (sx, cx) = e.x.sin_cos();
        let (sy, cy) = e.y.sin_cos();
        let (sz, cz) = e.z.sin_cos();
        Self::from_basis(
            Vector3::new(cz * cy, sz * cy, -sy),
            Vector3::new(cz * sy * sx - sz * cx, sz * sy * sx + cz * cx, cy * sx),
            Vector3::new(cz * sy * cx + sz * sx, sz * sy * cx - cz * sx, cy * cx),
        )
    }

    /// Builds a matrix whose basis columns are `x`, `y`, `z` and whose
    /// translation is zero.
    pub fn from_basis(x: Vector3, y: Vector3, z: Vector3) -> Self {
        Self::from_cols_array([
            x.x, x.y, x.z, 0.0, //
            y.x, y.y, y.z, 0.0, //
            z.x, z.y, z.z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Composes translation * rotation * scale. The scale multiplies the
    /// rotated basis columns, so non-uniform scale never skews the rotation.
    pub fn compose(position: Vector3, rotation: Euler, scale: Vector3) -> Self {
        let mut m = Self::from_euler(rotation);
        for (col, s) in [(0, scale.x), (4, scale.y), (8, scale.z)] {
            m.elements[col] *= s;
            m.elements[col + 1] *= s;
            m.elements[col + 2] *= s;
        }
        m.elements[12] = position.x;
        m.elements[13] = position.y;
        m.elements[14] = position.z;
        m
    }

    /// Classic GL perspective projection with a symmetric frustum.
    ///
    /// `fov_deg` is the vertical field of view in degrees. The resulting
    /// clip range is [-1, 1]; the renderer converts to the [0, 1] depth
    /// range expected by the surface when composing camera uniforms.
    pub fn perspective(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_deg.to_radians() / 2.0).tan();
        let inv = 1.0 / (near - far);
        let mut m = Self::from_cols_array([0.0; 16]);
        m.elements[0] = f / aspect;
        m.elements[5] = f;
        m.elements[10] = (near + far) * inv;
        m.elements[11] = -1.0;
        m.elements[14] = 2.0 * near * far * inv;
        m
    }

    pub fn transpose(self) -> Self {
        let e = &self.elements;
        Self::from_cols_array([
            e[0], e[4], e[8], e[12], //
            e[1], e[5], e[9], e[13], //
            e[2], e[6], e[10], e[14], //
            e[3], e[7], e[11], e[15],
        ])
    }

    pub fn determinant(&self) -> f32 {
        let e = &self.elements;
        let b00 = e[0] * e[5] - e[1] * e[4];
        let b01 = e[0] * e[6] - e[2] * e[4];
        let b02 = e[0] * e[7] - e[3] * e[4];
        let b03 = e[1] * e[6] - e[2] * e[5];
        let b04 = e[1] * e[7] - e[3] * e[5];
        let b05 = e[2] * e[7] - e[3] * e[6];
        let b06 = e[8] * e[13] - e[9] * e[12];
        let b07 = e[8] * e[14] - e[10] * e[12];
        let b08 = e[8] * e[15] - e[11] * e[12];
        let b09 = e[9] * e[14] - e[10] * e[13];
        let b10 = e[9] * e[15] - e[11] * e[13];
        let b11 = e[10] * e[15] - e[11] * e[14];
        b00 * b11 - b01 * b10 + b02 * b09 + b03 * b08 - b04 * b07 + b05 * b06
    }

    /// Cofactor inverse. `None` when the determinant is zero.
    pub fn inverse(&self) -> Option<Self> {
        let e = &self.elements;
        let b00 = e[0] * e[5] - e[1] * e[4];
        let b01 = e[0] * e[6] - e[2] * e[4];
        let b02 = e[0] * e[7] - e[3] * e[4];
        let b03 = e[1] * e[6] - e[2] * e[5];
        let b04 = e[1] * e[7] - e[3] * e[5];
        let b05 = e[2] * e[7] - e[3] * e[6];
        let b06 = e[8] * e[13] - e[9] * e[12];
        let b07 = e[8] * e[14] - e[10] * e[12];
        let b08 = e[8] * e[15] - e[11] * e[12];
        let b09 = e[9] * e[14] - e[10] * e[13];
        let b10 = e[9] * e[15] - e[11] * e[13];
        let b11 = e[10] * e[15] - e[11] * e[14];

        let det = b00 * b11 - b01 * b10 + b02 * b09 + b03 * b08 - b04 * b07 + b05 * b06;
        if det == 0.0 {
            return None;
        }
        let inv = 1.0 / det;

        Some(Self::from_cols_array([
            (e[5] * b11 - e[6] * b10 + e[7] * b09) * inv,
            (e[2] * b10 - e[1] * b11 - e[3] * b09) * inv,
            (e[13] * b05 - e[14] * b04 + e[15] * b03) * inv,
            (e[10] * b04 - e[9] * b05 - e[11] * b03) * inv,
            (e[6] * b08 - e[4] * b11 - e[7] * b07) * inv,
            (e[0] * b11 - e[2] * b08 + e[3] * b07) * inv,
            (e[14] * b02 - e[12] * b05 - e[15] * b01) * inv,
            (e[8] * b05 - e[10] * b02 + e[11] * b01) * inv,
            (e[4] * b10 - e[5] * b08 + e[7] * b06) * inv,
            (e[1] * b08 - e[0] * b10 - e[3] * b06) * inv,
            (e[12] * b04 - e[13] * b02 + e[15] * b00) * inv,
            (e[9] * b02 - e[8] * b04 - e[11] * b00) * inv,
            (e[5] * b07 - e[4] * b09 - e[6] * b06) * inv,
            (e[0] * b09 - e[1] * b07 + e[2] * b06) * inv,
            (e[13] * b01 - e[12] * b03 - e[14] * b00) * inv,
            (e[8] * b03 - e[9] * b01 + e[10] * b00) * inv,
        ]))
    }

    /// Applies the transform to a point (`w = 1`), without the perspective
    /// divide.
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        let e = &self.elements;
        Vector3::new(
            e[0] * p.x + e[4] * p.y + e[8] * p.z + e[12],
            e[1] * p.x + e[5] * p.y + e[9] * p.z + e[13],
            e[2] * p.x + e[6] * p.y + e[10] * p.z + e[14],
        )
    }

    /// Applies the transform to a homogeneous vector.
    pub fn transform(&self, v: Vector4) -> Vector4 {
        let e = &self.elements;
        Vector4::new(
            e[0] * v.x + e[4] * v.y + e[8] * v.z + e[12] * v.w,
            e[1] * v.x + e[5] * v.y + e[9] * v.z + e[13] * v.w,
            e[2] * v.x + e[6] * v.y + e[10] * v.z + e[14] * v.w,
            e[3] * v.x + e[7] * v.y + e[11] * v.z + e[15] * v.w,
        )
    }

    pub fn to_cols_array(self) -> [f32; 16] {
        self.elements
    }

    pub fn to_cols_array_2d(self) -> [[f32; 4]; 4] {
        let e = &self.elements;
        [
            [e[0], e[1], e[2], e[3]],
            [e[4], e[5], e[6], e[7]],
            [e[8], e[9], e[10], e[11]],
            [e[12], e[13], e[14], e[15]],
        ]
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = &self.elements;
        let b = &rhs.elements;
        let mut out = [0.0; 16];
        for c in 0..4 {
            for r in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[k * 4 + r] * b[c * 4 + k];
                }
                out[c * 4 + r] = sum;
            }
        }
        Self::from_cols_array(out)
    }
}
