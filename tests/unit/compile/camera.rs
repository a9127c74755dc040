use super::*;
use crate::animation::keyframer::Animation;
use crate::foundation::math::project_to_pixels;
use serde_json::json;

const HD: Canvas = Canvas {
    width: 1280,
    height: 720,
};

fn camera(kind: CameraKind, keys: serde_json::Value) -> Camera {
    let keys: Vec<serde_json::Value> = serde_json::from_value(keys).unwrap();
    Camera {
        kind,
        animation: Animation::load(&keys, &Default::default()).unwrap(),
    }
}

fn close(a: crate::foundation::core::Point, x: f64, y: f64) -> bool {
    (a.x - x).abs() < 1e-6 && (a.y - y).abs() < 1e-6
}

#[test]
fn default_ortho_camera_maps_world_units_to_pixels() {
    let cam = CameraState::sample(&camera(CameraKind::Ortho, json!([])), 0.0);
    assert_eq!(cam.magnitude, 720.0);
    let vp = cam.view_projection(HD);
    assert!(close(project_to_pixels(&vp, DVec3::ZERO, HD).unwrap(), 640.0, 360.0));
    assert!(close(
        project_to_pixels(&vp, DVec3::new(640.0, 360.0, 0.0), HD).unwrap(),
        1280.0,
        0.0
    ));
}

#[test]
fn camera_position_pans_the_view() {
    let cam = CameraState::sample(&camera(CameraKind::Ortho, json!([{ "time": 0, "x": 100 }])), 0.0);
    let vp = cam.view_projection(HD);
    let p = project_to_pixels(&vp, DVec3::new(100.0, 0.0, 0.0), HD).unwrap();
    assert!(close(p, 640.0, 360.0));
}

#[test]
fn camera_is_sampled_at_layer_time() {
    let cam = camera(
        CameraKind::Ortho,
        json!([{ "time": 0, "magnitude": 720 }, { "time": 2, "magnitude": 360 }]),
    );
    assert_eq!(CameraState::sample(&cam, 1.0).magnitude, 540.0);
    assert_eq!(CameraState::sample(&cam, 5.0).magnitude, 360.0);
}

#[test]
fn perspective_camera_centers_points_on_its_axis() {
    let cam = CameraState::sample(&camera(CameraKind::Perspective, json!([])), 0.0);
    let vp = cam.view_projection(HD);
    let p = project_to_pixels(&vp, DVec3::new(0.0, 0.0, -10.0), HD).unwrap();
    assert!(close(p, 640.0, 360.0));
    // Behind the camera.
    assert!(project_to_pixels(&vp, DVec3::new(0.0, 0.0, 10.0), HD).is_none());
}
