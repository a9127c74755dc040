use std::path::PathBuf;

use anyhow::Context;

use crate::foundation::core::Fps;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`FrameSink`] at the start of a capture.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    pub fps: Fps,
    /// Soundtrack to mux, for sinks that carry audio.
    pub audio: Option<AudioInput>,
}

/// Audio file muxed next to the video stream; decoding is left to the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInput {
    pub path: PathBuf,
    /// Seconds skipped at the start of the file so that it lines up with frame 0.
    pub offset: f64,
}

/// Consumer of captured frames.
///
/// `push_frame` is called in strictly increasing frame order between one `begin` and one `end`.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> LayerplayResult<()>;
    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> LayerplayResult<()>;
    fn end(&mut self) -> LayerplayResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(u64, FrameRGBA)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> LayerplayResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> LayerplayResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> LayerplayResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Writes one PNG per frame: `<dir>/frame_00000.png`, `frame_00001.png`, ...
///
/// Audio is ignored.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    started: bool,
    written: u64,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            started: false,
            written: 0,
        }
    }

    pub fn frame_path(&self, idx: u64) -> PathBuf {
        self.dir.join(format!("frame_{idx:05}.png"))
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> LayerplayResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(LayerplayError::validation(
                "png sink width/height must be non-zero",
            ));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create frame directory '{}'", self.dir.display()))?;
        if cfg.audio.is_some() {
            tracing::debug!("png sequence output has no audio track; soundtrack not written");
        }
        self.started = true;
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> LayerplayResult<()> {
        if !self.started {
            return Err(LayerplayError::evaluation("png sink not started"));
        }
        let path = self.frame_path(idx);
        frame
            .to_rgba_image()?
            .save_with_format(&path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> LayerplayResult<()> {
        self.started = false;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
