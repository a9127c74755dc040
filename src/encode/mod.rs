//! Capture outputs.
//!
//! Sinks consume rendered frames in frame order and are driven by [`crate::Player::capture`].

/// `ffmpeg`-based MP4 output via the system `ffmpeg`.
pub mod ffmpeg;
/// Frame sink trait and built-in sinks.
pub mod sink;

use std::path::Path;

use crate::session::demo::CaptureConfig;
use ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use sink::{FrameSink, PngSequenceSink};

/// Pick a sink for `out`: `.mp4` files go through `ffmpeg`, anything else is a PNG directory.
pub fn sink_for_output(out: &Path, capture: &CaptureConfig) -> Box<dyn FrameSink> {
    let is_mp4 = out
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
    if is_mp4 {
        let mut opts = FfmpegSinkOpts::new(out);
        opts.encoder = capture.encoder;
        opts.crf = capture.crf;
        Box::new(FfmpegSink::new(opts))
    } else {
        Box::new(PngSequenceSink::new(out))
    }
}
