use super::*;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn demo_defaults_fill_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "demo.json", r#"{"duration": 12.5}"#);
    let demo = DemoConfig::load(&path).unwrap();
    assert_eq!(demo.title, "untitled");
    assert_eq!(demo.duration, 12.5);
    assert_eq!(demo.time_scale, 1.0);
    assert!(demo.soundtrack.is_none());
    assert!(demo.font.is_none());
}

#[test]
fn demo_reads_kebab_case_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "demo.json",
        r#"{
            "title": "flow",
            "duration": 90,
            "soundtrack": {"file": "sound/track.ogg", "offset": 1.5},
            "time-scale": 1.8666,
            "font": "fonts/mono.ttf"
        }"#,
    );
    let demo = DemoConfig::load(&path).unwrap();
    assert_eq!(demo.title, "flow");
    assert_eq!(
        demo.soundtrack,
        Some(Soundtrack {
            file: "sound/track.ogg".to_string(),
            offset: 1.5
        })
    );
    assert!((demo.animation_time(10.0) - 18.666).abs() < 1e-9);
    assert_eq!(demo.font.as_deref(), Some("fonts/mono.ttf"));
}

#[test]
fn bad_demo_values_name_the_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "demo.json", r#"{"time-scale": 0}"#);
    let err = DemoConfig::load(&path).unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("time-scale"), "{err}");

    let path = write(dir.path(), "broken.json", "{ nope");
    let err = DemoConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("malformed JSON"), "{err}");
    assert!(err.to_string().contains("broken.json"), "{err}");
}

#[test]
fn player_config_is_fully_optional() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "config.json", "{}");
    let cfg = PlayerConfig::load(&path).unwrap();
    assert_eq!(cfg, PlayerConfig::default());
    assert_eq!(cfg.demo, PathBuf::from("."));
    assert_eq!(cfg.target.canvas(), Canvas { width: 1280, height: 720 });
    assert_eq!(cfg.capture.framerate, 60);
    assert_eq!(cfg.capture.crf, 13);
    assert_eq!(cfg.capture.encoder, Encoder::X264);
    assert_eq!(
        cfg.capture.temporal_blur,
        TemporalBlurConfig {
            enabled: false,
            samples: 10
        }
    );
    assert_eq!(cfg.capture.blur_samples(), 1);
    assert!(!cfg.presentation.looping);
    assert_eq!(cfg.presentation.hold_after_end, 3.0);
    assert!(!cfg.tools.bill_of_materials);
}

#[test]
fn player_config_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "config.json",
        r#"{
            "demo": "demos/flow",
            "target": {"width": 640},
            "capture": {"framerate": 30, "encoder": "x265", "output": "out.mp4"},
            "presentation": {"loop": true},
            "tools": {"bill-of-materials": true}
        }"#,
    );
    let cfg = PlayerConfig::load(&path).unwrap();
    assert_eq!(cfg.paths().animations(), PathBuf::from("demos/flow/animations"));
    assert_eq!(cfg.target.width, 640);
    assert_eq!(cfg.target.height, 720);
    assert_eq!(cfg.capture.encoder.codec(), "libx265");
    assert_eq!(cfg.capture.output, Some(PathBuf::from("out.mp4")));
    assert_eq!(cfg.fps().unwrap().as_f64(), 30.0);
    assert!(cfg.presentation.looping);
    assert!(cfg.tools.bill_of_materials);
}

#[test]
fn zero_framerate_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "config.json", r#"{"capture": {"framerate": 0}}"#);
    let err = PlayerConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("capture.framerate"), "{err}");
}

#[test]
fn temporal_blur_reads_kebab_case_and_needs_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "config.json",
        r#"{"capture": {"temporal-blur": {"enabled": true, "samples": 4}}}"#,
    );
    let cfg = PlayerConfig::load(&path).unwrap();
    assert_eq!(cfg.capture.blur_samples(), 4);

    let path = write(
        dir.path(),
        "config.json",
        r#"{"capture": {"temporal-blur": {"samples": 0}}}"#,
    );
    assert_eq!(PlayerConfig::load(&path).unwrap().capture.blur_samples(), 1);

    let path = write(
        dir.path(),
        "config.json",
        r#"{"capture": {"temporal-blur": {"enabled": true, "samples": 0}}}"#,
    );
    let err = PlayerConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("capture.temporal-blur.samples"), "{err}");
}

#[test]
fn demo_paths_layout() {
    let paths = DemoPaths::new("/demos/a");
    assert_eq!(paths.demo_file(), PathBuf::from("/demos/a/demo.json"));
    assert_eq!(paths.animations(), PathBuf::from("/demos/a/animations"));
    assert_eq!(paths.assets(), PathBuf::from("/demos/a/assets"));
}
