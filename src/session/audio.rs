use std::time::Instant;

use crate::foundation::core::Fps;

/// Playback position source the player follows.
///
/// Positions are in audio seconds; the player applies the demo's time scale.
pub trait AudioChannel {
    fn set_position(&mut self, seconds: f64);

    fn position(&self) -> f64;

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;
}

/// Wall-clock channel used when no audio output is attached.
#[derive(Debug)]
pub struct ClockChannel {
    /// Position at `started`, or the frozen position while paused.
    base: f64,
    started: Option<Instant>,
}

impl ClockChannel {
    /// A running clock starting at zero.
    pub fn new() -> Self {
        Self {
            base: 0.0,
            started: Some(Instant::now()),
        }
    }

    pub fn paused() -> Self {
        Self {
            base: 0.0,
            started: None,
        }
    }
}

impl Default for ClockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioChannel for ClockChannel {
    fn set_position(&mut self, seconds: f64) {
        self.base = seconds.max(0.0);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn position(&self) -> f64 {
        match self.started {
            Some(at) => self.base + at.elapsed().as_secs_f64(),
            None => self.base,
        }
    }

    fn pause(&mut self) {
        if self.started.is_some() {
            self.base = self.position();
            self.started = None;
        }
    }

    fn resume(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn is_paused(&self) -> bool {
        self.started.is_none()
    }
}

/// Frame-accurate channel for capture: the position is `frame / fps`.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    fps: Fps,
    frame: u64,
    paused: bool,
}

impl FrameClock {
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            frame: 0,
            paused: false,
        }
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    /// Move one frame forward unless paused.
    pub fn step(&mut self) {
        if !self.paused {
            self.frame += 1;
        }
    }
}

impl AudioChannel for FrameClock {
    /// Snaps to the nearest frame.
    fn set_position(&mut self, seconds: f64) {
        self.frame = (seconds.max(0.0) * self.fps.as_f64()).round() as u64;
    }

    fn position(&self) -> f64 {
        self.fps.frames_to_secs(self.frame)
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/audio.rs"]
mod tests;
