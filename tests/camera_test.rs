use lumen_ngin::{
    math::{Euler, Vector3},
    Camera, EngineError,
};

const EPS: f32 = 1e-5;

#[test]
fn constructor_rejects_degenerate_parameters() {
    assert!(matches!(
        Camera::new(0.0, 1.0, 0.1, 100.0),
        Err(EngineError::DegenerateProjection { .. })
    ));
    assert!(Camera::new(180.0, 1.0, 0.1, 100.0).is_err());
    assert!(Camera::new(45.0, 0.0, 0.1, 100.0).is_err());
    assert!(Camera::new(45.0, 1.0, 5.0, 5.0).is_err());
    assert!(Camera::new(45.0, 1.0, 0.1, 100.0).is_ok());
}

#[test]
fn rejected_update_keeps_last_good_projection() {
    let mut camera = Camera::new(45.0, 2.0, 0.1, 100.0).unwrap();
    let before = camera.projection_matrix();

    camera.fov = 260.0;
    assert!(camera.update_projection_matrix().is_err());
    assert_eq!(camera.projection_matrix(), before);

    camera.fov = 45.0;
    assert!(camera.set_aspect(-1.0).is_err());
    assert_eq!(camera.projection_matrix(), before);

    // A valid aspect change does rebuild.
    camera.set_aspect(1.0).unwrap();
    assert_ne!(camera.projection_matrix(), before);
}

#[test]
fn look_at_points_the_view_down_the_target() {
    let mut camera = Camera::new(45.0, 1.0, 0.1, 100.0).unwrap();
    camera.position = Vector3::new(0.0, 0.0, 5.0);
    camera.look_at(Vector3::ZERO);
    assert_eq!(camera.target(), Some(Vector3::ZERO));

    // Looking down -Z from +Z is the identity orientation.
    let r = camera.rotation_matrix().elements;
    for (i, e) in r.iter().enumerate() {
        let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
        assert!((e - expected).abs() < EPS, "element {i}: {e}");
    }

    // The view transform moves the target to 5 units in front.
    let seen = camera.view_matrix().transform_point(Vector3::ZERO);
    assert!(seen.distance_to(Vector3::new(0.0, 0.0, -5.0)) < EPS);
}

#[test]
fn look_at_from_the_side_faces_the_target() {
    let mut camera = Camera::new(45.0, 1.0, 0.1, 100.0).unwrap();
    camera.position = Vector3::new(10.0, 0.0, 0.0);
    camera.look_at(Vector3::ZERO);

    let seen = camera.view_matrix().transform_point(Vector3::ZERO);
    assert!(seen.distance_to(Vector3::new(0.0, 0.0, -10.0)) < EPS);
}

#[test]
fn euler_rotation_drives_the_view_until_a_target_is_set() {
    let mut camera = Camera::new(45.0, 1.0, 0.1, 100.0).unwrap();
    camera.rotation = Euler::new(0.0, std::f32::consts::FRAC_PI_2, 0.0);

    // Camera turned 90 degrees left: world -X ends up straight ahead.
    let seen = camera.view_matrix().transform_point(Vector3::new(-1.0, 0.0, 0.0));
    assert!(seen.distance_to(Vector3::new(0.0, 0.0, -1.0)) < EPS);

    camera.look_at(Vector3::new(0.0, 0.0, -1.0));
    assert!(camera.target().is_some());
    camera.clear_target();
    assert!(camera.target().is_none());
}
