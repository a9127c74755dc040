use super::*;
use crate::encode::sink::InMemorySink;
use crate::render::{BackendKind, create_backend};
use crate::session::audio::ClockChannel;
use crate::session::demo::PlayerConfig;

const RED_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="720" height="720">
    <rect x="0" y="0" width="720" height="720" fill="#ff0000"/>
</svg>"##;

/// Demo whose only object is visible for the first half second.
fn player(demo_json: &str) -> (tempfile::TempDir, Player) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("animations")).unwrap();
    std::fs::create_dir_all(root.join("assets")).unwrap();
    std::fs::write(root.join("demo.json"), demo_json).unwrap();
    std::fs::write(root.join("assets/red.svg"), RED_SVG).unwrap();
    std::fs::write(
        root.join("animations/main.json"),
        r#"{"objects": [{
            "assets": ["red.svg"],
            "attributes": {"fill": "asset", "stroke": "asset"},
            "keyframer": [{"time": 0}, {"time": 0.5}]
        }]}"#,
    )
    .unwrap();

    let mut cfg = PlayerConfig {
        demo: root.to_path_buf(),
        ..PlayerConfig::default()
    };
    cfg.target.width = 4;
    cfg.target.height = 4;
    let player = Player::open(
        &cfg,
        create_backend(BackendKind::Cpu),
        Box::new(ClockChannel::paused()),
    )
    .unwrap();
    (dir, player)
}

fn first_px(frame: &crate::render::FrameRGBA) -> [u8; 4] {
    [frame.data[0], frame.data[1], frame.data[2], frame.data[3]]
}

#[test]
fn captures_the_whole_demo_frame_by_frame() {
    let (_dir, mut player) = player(r#"{"duration": 1}"#);
    let mut sink = InMemorySink::new();
    let stats = player
        .capture(&CaptureOpts::new(Fps::new(4, 1).unwrap()), &mut sink)
        .unwrap();
    assert_eq!(
        stats,
        CaptureStats {
            first_frame: 0,
            frames: 4
        }
    );
    assert!(sink.is_ended());
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height), (4, 4));
    assert!(cfg.audio.is_none());

    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| *i).collect();
    assert_eq!(idx, vec![0, 1, 2, 3]);
    let px: Vec<[u8; 4]> = sink.frames().iter().map(|(_, f)| first_px(f)).collect();
    assert_eq!(
        px,
        vec![[255, 0, 0, 255], [255, 0, 0, 255], [0, 0, 0, 255], [0, 0, 0, 255]]
    );
}

#[test]
fn sub_ranges_reindex_from_zero_and_offset_the_soundtrack() {
    let (dir, mut player) = player(
        r#"{"duration": 1, "soundtrack": {"file": "sound/track.ogg", "offset": 2.0}}"#,
    );
    let mut sink = InMemorySink::new();
    let opts = CaptureOpts {
        from: 0.5,
        ..CaptureOpts::new(Fps::new(4, 1).unwrap())
    };
    let stats = player.capture(&opts, &mut sink).unwrap();
    assert_eq!(stats.first_frame, 2);
    assert_eq!(stats.frames, 2);
    assert_eq!(sink.frames()[0].0, 0);
    assert_eq!(first_px(&sink.frames()[0].1), [0, 0, 0, 255]);

    let audio = sink.config().unwrap().audio.clone().unwrap();
    assert_eq!(audio.path, dir.path().join("assets/sound/track.ogg"));
    assert_eq!(audio.offset, 2.5);

    let silent = CaptureOpts {
        audio: false,
        ..opts
    };
    player.capture(&silent, &mut sink).unwrap();
    assert!(sink.config().unwrap().audio.is_none());
}

#[test]
fn empty_ranges_are_rejected() {
    let (_dir, mut player) = player(r#"{"duration": 0}"#);
    let mut sink = InMemorySink::new();
    let err = player
        .capture(&CaptureOpts::new(Fps::new(30, 1).unwrap()), &mut sink)
        .unwrap_err();
    assert!(err.to_string().contains("no frames"), "{err}");
    assert!(sink.config().is_none());

    let opts = CaptureOpts {
        to: Some(0.1),
        ..CaptureOpts::new(Fps::new(30, 1).unwrap())
    };
    assert_eq!(player.capture(&opts, &mut sink).unwrap().frames, 3);
}

#[test]
fn temporal_blur_averages_sub_frame_renders() {
    let (_dir, mut player) = player(r#"{"duration": 2}"#);
    let mut sink = InMemorySink::new();
    let opts = CaptureOpts {
        blur_samples: 2,
        ..CaptureOpts::new(Fps::new(1, 1).unwrap())
    };
    let stats = player.capture(&opts, &mut sink).unwrap();
    assert_eq!(stats.frames, 2);

    // Frame 0 samples 0.0 (object up) and 0.5 (object gone).
    let px: Vec<[u8; 4]> = sink.frames().iter().map(|(_, f)| first_px(f)).collect();
    assert_eq!(px, vec![[128, 0, 0, 255], [0, 0, 0, 255]]);

    let sharp = CaptureOpts {
        blur_samples: 1,
        ..opts
    };
    player.capture(&sharp, &mut sink).unwrap();
    assert_eq!(first_px(&sink.frames()[0].1), [255, 0, 0, 255]);
}

#[test]
fn zero_blur_samples_are_rejected() {
    let (_dir, mut player) = player(r#"{"duration": 1}"#);
    let mut sink = InMemorySink::new();
    let opts = CaptureOpts {
        blur_samples: 0,
        ..CaptureOpts::new(Fps::new(4, 1).unwrap())
    };
    let err = player.capture(&opts, &mut sink).unwrap_err();
    assert!(err.to_string().contains("sample"), "{err}");
}
