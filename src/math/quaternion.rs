//! Unit quaternions for rotation.

use std::ops::Mul;

use super::{Euler, Matrix4, Vector3};

/// A rotation quaternion `w + xi + yj + zk`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around `axis`. The axis is normalized
    /// internally; a zero axis yields the identity rotation.
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle * 0.5).sin_cos();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: c,
        }
    }

    /// The quaternion equivalent of [`Matrix4::from_euler`]: X applied
    /// first, then Y, then Z.
    pub fn from_euler(e: Euler) -> Self {
        let qx = Self::from_axis_angle(Vector3::UNIT_X, e.x);
        let qy = Self::from_axis_angle(Vector3::UNIT_Y, e.y);
        let qz = Self::from_axis_angle(Vector3::UNIT_Z, e.z);
        qz * qy * qx
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Returns the unit quaternion, or the identity when the length is zero.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            let inv = 1.0 / len;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates a vector by this quaternion (assumed unit length).
    pub fn rotate(self, v: Vector3) -> Vector3 {
        // v' = v + 2 * q_v x (q_v x v + w * v)
        let qv = Vector3::new(self.x, self.y, self.z);
        let t = qv.cross(v) * 2.0;
        v + t * self.w + qv.cross(t)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

impl From<Quaternion> for Matrix4 {
    fn from(q: Quaternion) -> Self {
        let Quaternion { x, y, z, w } = q.normalize();
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);
        Matrix4::from_basis(
            Vector3::new(1.0 - (yy + zz), xy + wz, xz - wy),
            Vector3::new(xy - wz, 1.0 - (xx + zz), yz + wx),
            Vector3::new(xz + wy, yz - wx, 1.0 - (xx + yy)),
        )
    }
}
