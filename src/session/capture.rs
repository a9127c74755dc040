use crate::encode::sink::{AudioInput, FrameSink, SinkConfig};
use crate::foundation::core::Fps;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::render::backend::FrameRGBA;
use crate::render::composite::SampleAccumulator;
use crate::session::audio::{AudioChannel, FrameClock};
use crate::session::player::Player;

/// Frame range and options for [`Player::capture`]. Times are in audio seconds.
#[derive(Clone, Copy, Debug)]
pub struct CaptureOpts {
    pub fps: Fps,
    pub from: f64,
    /// Defaults to the demo duration.
    pub to: Option<f64>,
    /// Mux the soundtrack when the sink supports it.
    pub audio: bool,
    /// Renders averaged into each frame; 1 disables temporal blur.
    pub blur_samples: u32,
}

impl CaptureOpts {
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            from: 0.0,
            to: None,
            audio: true,
            blur_samples: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub first_frame: u64,
    pub frames: u64,
}

impl Player {
    /// Render `[from, to)` at a fixed frame rate into `sink`.
    ///
    /// Frame `i` is rendered at animation time `i / fps * time-scale`; the sink sees indices
    /// starting at zero. With `blur_samples > 1` each frame is the mean of renders at
    /// `(i + k / blur_samples) / fps` for every `k` below `blur_samples`.
    #[tracing::instrument(skip(self, sink))]
    pub fn capture(
        &mut self,
        opts: &CaptureOpts,
        sink: &mut dyn FrameSink,
    ) -> LayerplayResult<CaptureStats> {
        let to = opts.to.unwrap_or(self.demo().duration);
        if !opts.from.is_finite() || !to.is_finite() || opts.from < 0.0 {
            return Err(LayerplayError::validation(
                "capture range must be finite and start at >= 0",
            ));
        }
        let fps = opts.fps.as_f64();
        let first = (opts.from * fps).round() as u64;
        let end = (to * fps).round().max(0.0) as u64;
        if opts.blur_samples == 0 {
            return Err(LayerplayError::validation("capture blur needs at least one sample"));
        }
        if end <= first {
            return Err(LayerplayError::validation(format!(
                "capture range [{}, {to}) holds no frames at {fps} fps",
                opts.from
            )));
        }

        let audio = match (&self.demo().soundtrack, opts.audio) {
            (Some(track), true) => Some(AudioInput {
                path: self.paths().assets().join(&track.file),
                offset: track.offset + opts.fps.frames_to_secs(first),
            }),
            _ => None,
        };
        let canvas = self.canvas();
        sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: opts.fps,
            audio,
        })?;

        let mut clock = FrameClock::new(opts.fps);
        clock.set_frame(first);
        while clock.frame() < end {
            let frame = self.render_exposure(clock.position(), opts)?;
            sink.push_frame(clock.frame() - first, &frame)?;
            clock.step();
        }
        sink.end()?;

        let stats = CaptureStats {
            first_frame: first,
            frames: end - first,
        };
        tracing::info!(
            frames = stats.frames,
            blur_samples = opts.blur_samples,
            "capture finished"
        );
        Ok(stats)
    }

    /// One captured frame starting at audio `position`, averaged over its interval when blurred.
    fn render_exposure(
        &mut self,
        position: f64,
        opts: &CaptureOpts,
    ) -> LayerplayResult<FrameRGBA> {
        let time = self.demo().animation_time(position);
        let mut frame = self.render_at(time)?.color;
        if opts.blur_samples <= 1 {
            return Ok(frame);
        }

        let step = opts.fps.frames_to_secs(1) / f64::from(opts.blur_samples);
        let mut acc = SampleAccumulator::new(frame.data.len());
        acc.add(&frame.data)?;
        for k in 1..opts.blur_samples {
            let time = self.demo().animation_time(position + f64::from(k) * step);
            acc.add(&self.render_at(time)?.color.data)?;
        }
        acc.average_into(&mut frame.data)?;
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/capture.rs"]
mod tests;
