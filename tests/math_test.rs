use lumen_ngin::math::{Euler, Matrix3, Matrix4, Quaternion, Vector3};

use std::f32::consts::FRAC_PI_2;

const EPS: f32 = 1e-5;

fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < EPS, "expected {b}, got {a}");
}

fn assert_vec_close(a: Vector3, b: Vector3) {
    assert!(
        a.distance_to(b) < EPS,
        "expected {b:?}, got {a:?} (distance {})",
        a.distance_to(b)
    );
}

#[test]
fn perspective_matches_gl_identities() {
    let (fov, aspect, near, far) = (60.0f32, 1.5f32, 0.1f32, 100.0f32);
    let m = Matrix4::perspective(fov, aspect, near, far).elements;

    let f = 1.0 / (fov.to_radians() / 2.0).tan();
    assert_close(m[0], f / aspect);
    assert_close(m[5], f);
    assert_close(m[10], (near + far) / (near - far));
    assert_close(m[11], -1.0);
    assert_close(m[14], 2.0 * near * far / (near - far));
    assert_close(m[15], 0.0);
}

#[test]
fn inverse_round_trips_to_identity() {
    let m = Matrix4::compose(
        Vector3::new(3.0, -2.0, 7.5),
        Euler::new(0.4, -1.1, 2.3),
        Vector3::new(2.0, 0.5, 1.25),
    );
    let inv = m.inverse().expect("invertible transform");
    let id = (m * inv).elements;
    for (i, e) in id.iter().enumerate() {
        let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
        assert!((e - expected).abs() < 1e-4, "element {i}: {e}");
    }
}

#[test]
fn singular_matrix_has_no_inverse() {
    // Zero scale on one axis collapses a dimension.
    let m = Matrix4::from_nonuniform_scale(Vector3::new(1.0, 0.0, 1.0));
    assert_eq!(m.determinant(), 0.0);
    assert!(m.inverse().is_none());

    let zero = Matrix4::from_cols_array([0.0; 16]);
    assert!(zero.inverse().is_none());
}

#[test]
fn euler_order_is_x_then_y_then_z() {
    // Quarter turn about X maps +Y to +Z.
    let rx = Matrix4::from_euler(Euler::new(FRAC_PI_2, 0.0, 0.0));
    assert_vec_close(rx.transform_point(Vector3::UNIT_Y), Vector3::UNIT_Z);

    // Quarter turn about Y maps +Z to +X.
    let ry = Matrix4::from_euler(Euler::new(0.0, FRAC_PI_2, 0.0));
    assert_vec_close(ry.transform_point(Vector3::UNIT_Z), Vector3::UNIT_X);

    // Quarter turn about Z maps +X to +Y.
    let rz = Matrix4::from_euler(Euler::new(0.0, 0.0, FRAC_PI_2));
    assert_vec_close(rz.transform_point(Vector3::UNIT_X), Vector3::UNIT_Y);

    // Combined: X applied first, then Y, then Z. +Y goes to +Z under the
    // X turn, to +X under the Y turn, to +Y under the Z turn.
    let all = Matrix4::from_euler(Euler::new(FRAC_PI_2, FRAC_PI_2, FRAC_PI_2));
    assert_vec_close(all.transform_point(Vector3::UNIT_Y), Vector3::UNIT_Y);
}

#[test]
fn compose_scales_basis_without_skew() {
    let m = Matrix4::compose(
        Vector3::new(1.0, 2.0, 3.0),
        Euler::new(0.0, FRAC_PI_2, 0.0),
        Vector3::new(2.0, 3.0, 4.0),
    );
    // Translation lands untouched in the last column.
    assert_close(m.elements[12], 1.0);
    assert_close(m.elements[13], 2.0);
    assert_close(m.elements[14], 3.0);
    // A local +X offset is scaled by 2 then rotated onto -Z.
    assert_vec_close(
        m.transform_point(Vector3::UNIT_X),
        Vector3::new(1.0, 2.0, 3.0 - 2.0),
    );
    // Basis columns stay orthogonal under non-uniform scale.
    let x = Vector3::new(m.elements[0], m.elements[1], m.elements[2]);
    let y = Vector3::new(m.elements[4], m.elements[5], m.elements[6]);
    assert_close(x.dot(y), 0.0);
}

#[test]
fn quaternion_matches_euler_matrix() {
    let e = Euler::new(0.7, -0.3, 1.9);
    let from_euler = Matrix4::from_euler(e);
    let from_quat: Matrix4 = Quaternion::from_euler(e).into();
    for (a, b) in from_euler.elements.iter().zip(from_quat.elements.iter()) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    let q = Quaternion::from_axis_angle(Vector3::UNIT_Z, FRAC_PI_2);
    assert_vec_close(q.rotate(Vector3::UNIT_X), Vector3::UNIT_Y);
}

#[test]
fn matrix3_multiply_is_a_real_product() {
    let r = Matrix3::from_rotation(FRAC_PI_2);
    let t = Matrix3::from_translation(5.0, 0.0);
    let m = (t * r).elements;
    // Rotation part survives and the translation column is untouched:
    // an element-wise product would zero most of these.
    assert_close(m[0], 0.0);
    assert_close(m[1], 1.0);
    assert_close(m[3], -1.0);
    assert_close(m[6], 5.0);
    assert_close(m[7], 0.0);

    let id = Matrix3::IDENTITY;
    assert_eq!((id * r).elements, r.elements);
}

#[test]
fn matrix3_inverse_round_trips() {
    let m = Matrix3::from_rotation(0.8) * Matrix3::from_scale(2.0, 0.5);
    let inv = m.inverse().expect("invertible");
    let id = (m * inv).elements;
    for (i, e) in id.iter().enumerate() {
        let expected = if i % 4 == 0 { 1.0 } else { 0.0 };
        assert!((e - expected).abs() < 1e-5, "element {i}: {e}");
    }

    assert!(Matrix3::from_scale(0.0, 1.0).inverse().is_none());
}

#[test]
fn vector_normalize_handles_zero() {
    assert_eq!(Vector3::ZERO.normalize(), Vector3::ZERO);
    let v = Vector3::new(3.0, 0.0, 4.0).normalize();
    assert_close(v.length(), 1.0);
    assert_close(Vector3::new(1.0, 2.0, 2.0).length(), 3.0);
}
