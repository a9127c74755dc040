use super::*;

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(60, 1).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs + 1e-9), 123);
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn canvas_aspect_guards_zero_height() {
    assert_eq!(
        Canvas {
            width: 1280,
            height: 720
        }
        .aspect(),
        1280.0 / 720.0
    );
    assert_eq!(
        Canvas {
            width: 4,
            height: 0
        }
        .aspect(),
        1.0
    );
}

#[test]
fn modulate_is_per_channel_product() {
    let a = Rgba::new(0.5, 1.0, 0.25, 1.0);
    let b = Rgba::new(0.5, 0.5, 1.0, 0.5);
    assert_eq!(a.modulate(b), Rgba::new(0.25, 0.5, 0.25, 0.5));
    assert_eq!(a.modulate(Rgba::TRANSPARENT), Rgba::TRANSPARENT);
}

#[test]
fn to_premul_clamps_and_premultiplies() {
    assert_eq!(
        Rgba::new(2.0, 0.0, -1.0, 1.0).to_premul(),
        Rgba8Premul::from_straight_rgba(255, 0, 0, 255)
    );
    let half = Rgba::new(1.0, 1.0, 1.0, 0.5).to_premul();
    assert_eq!(half.a, 128);
    assert_eq!(half.r, 128);
}
