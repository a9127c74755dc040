/// Stop-motion quantization of animation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SteppingMode {
    /// Continuous time.
    #[default]
    None,
    /// Time advances in `steps` equal buckets over the track duration.
    Discrete,
}

/// Resolved stepping parameters of an object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stepping {
    pub mode: SteppingMode,
    pub steps: u32,
    /// `0` freezes motion inside each bucket, `1` keeps it continuous.
    pub inertia: f64,
}

impl Stepping {
    pub fn apply(&self, track_duration: f64, time: f64) -> f64 {
        step_time(track_duration, time, self.mode, self.steps, self.inertia)
    }
}

/// Map `time` onto its stepped equivalent inside `[0, track_duration]`.
pub fn step_time(
    track_duration: f64,
    time: f64,
    mode: SteppingMode,
    steps: u32,
    inertia: f64,
) -> f64 {
    match mode {
        SteppingMode::None => time,
        SteppingMode::Discrete => {
            if steps == 0 || track_duration <= 0.0 {
                return time.clamp(0.0, track_duration.max(0.0));
            }
            let bucket = track_duration / f64::from(steps);
            let s = time / bucket;
            let index = s.floor();
            let progress = s - index;
            ((index + progress * inertia) * bucket).clamp(0.0, track_duration)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/stepping.rs"]
mod tests;
