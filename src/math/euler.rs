//! Euler angles in radians.

/// Rotation expressed as angles around the world axes.
///
/// Composition order is fixed: the X rotation is applied first, then Y,
/// then Z (`R = Rz * Ry * Rx`). Every consumer of an `Euler` in this
/// crate builds its rotation matrix through [`crate::math::Matrix4::from_euler`],
/// which implements exactly that order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Euler {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn set(&mut self, x: f32, y: f32, z: f32) {
        self.x = x;
        self.y = y;
        self.z = z;
    }
}
