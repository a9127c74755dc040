use super::*;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::new(30, 1).unwrap(),
        audio: None,
    }
}

fn frame(px: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data: [px, px].concat(),
        premultiplied: true,
    }
}

#[test]
fn png_sequence_writes_numbered_frames() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames");
    let mut sink = PngSequenceSink::new(&out);
    sink.begin(cfg(2, 1)).unwrap();
    sink.push_frame(0, &frame([255, 0, 0, 255])).unwrap();
    sink.push_frame(1, &frame([0, 0, 128, 128])).unwrap();
    sink.end().unwrap();
    assert_eq!(sink.written(), 2);

    let first = image::open(out.join("frame_00000.png")).unwrap().to_rgba8();
    assert_eq!(first.get_pixel(1, 0).0, [255, 0, 0, 255]);
    let second = image::open(sink.frame_path(1)).unwrap().to_rgba8();
    assert_eq!(second.get_pixel(0, 0).0, [0, 0, 255, 128]);
}

#[test]
fn png_sequence_requires_begin() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngSequenceSink::new(dir.path());
    assert!(sink.push_frame(0, &frame([0, 0, 0, 255])).is_err());
    assert!(sink.begin(cfg(0, 1)).is_err());
}

#[test]
fn in_memory_sink_records_frames() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 1)).unwrap();
    sink.push_frame(4, &frame([1, 2, 3, 255])).unwrap();
    sink.end().unwrap();
    assert!(sink.is_ended());
    assert_eq!(sink.config().unwrap().width, 2);
    assert_eq!(sink.frames().len(), 1);
    assert_eq!(sink.frames()[0].0, 4);
}
