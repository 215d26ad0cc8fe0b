//! Math kernel: fixed-size vector, rotation and matrix types.
//!
//! Pure value types with no GPU dependency. All angle parameters are radians
//! unless a function name says otherwise, and all matrix types store their
//! elements as a flat float array in GPU upload order (basis columns first,
//! translation at elements 12..14 for [`Matrix4`]).

pub mod euler;
pub mod matrix3;
pub mod matrix4;
pub mod quaternion;
pub mod vector;

pub use euler::Euler;
pub use matrix3::Matrix3;
pub use matrix4::Matrix4;
pub use quaternion::Quaternion;
pub use vector::{Vector2, Vector3, Vector4};
