use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{LayerplayError, LayerplayResult};

/// Name of the demo descriptor inside a demo root.
pub const DEMO_FILE: &str = "demo.json";
/// Directory holding the layer files.
pub const ANIMATIONS_DIR: &str = "animations";
/// Directory asset paths resolve under.
pub const ASSETS_DIR: &str = "assets";

/// On-disk layout of a demo tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoPaths {
    pub root: PathBuf,
}

impl DemoPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn demo_file(&self) -> PathBuf {
        self.root.join(DEMO_FILE)
    }

    pub fn animations(&self) -> PathBuf {
        self.root.join(ANIMATIONS_DIR)
    }

    pub fn assets(&self) -> PathBuf {
        self.root.join(ASSETS_DIR)
    }
}

/// Soundtrack reference; `file` is relative to the assets root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Soundtrack {
    pub file: String,
    /// Soundtrack position, in seconds, that lines up with demo time zero.
    #[serde(default)]
    pub offset: f64,
}

/// `demo.json`: what is being played.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DemoConfig {
    pub title: String,
    /// Length of the demo in audio seconds.
    pub duration: f64,
    pub soundtrack: Option<Soundtrack>,
    /// Animation time units per audio second.
    pub time_scale: f64,
    /// Font used for text-curtain glyphs, relative to the assets root.
    pub font: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "untitled".to_string(),
            duration: 0.0,
            soundtrack: None,
            time_scale: 1.0,
            font: None,
        }
    }
}

impl DemoConfig {
    #[tracing::instrument(fields(file = %path.display()))]
    pub fn load(path: &Path) -> LayerplayResult<Self> {
        let cfg: Self = read_json(path)?;
        cfg.validate(path)?;
        Ok(cfg)
    }

    fn validate(&self, path: &Path) -> LayerplayResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(LayerplayError::config(
                path,
                "duration",
                "must be a finite number >= 0",
            ));
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(LayerplayError::config(
                path,
                "time-scale",
                "must be a finite number > 0",
            ));
        }
        if let Some(s) = &self.soundtrack
            && (!s.offset.is_finite() || s.offset < 0.0)
        {
            return Err(LayerplayError::config(
                path,
                "soundtrack.offset",
                "must be a finite number >= 0",
            ));
        }
        Ok(())
    }

    /// Animation time for an audio position.
    pub fn animation_time(&self, seconds: f64) -> f64 {
        seconds * self.time_scale
    }

    /// Audio position for an animation time.
    pub fn audio_time(&self, time: f64) -> f64 {
        time / self.time_scale
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl TargetConfig {
    pub fn canvas(self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Video codec used for `.mp4` capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoder {
    #[default]
    X264,
    X265,
}

impl Encoder {
    /// `ffmpeg` codec name.
    pub fn codec(self) -> &'static str {
        match self {
            Self::X264 => "libx264",
            Self::X265 => "libx265",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CaptureConfig {
    pub framerate: u32,
    /// Constant rate factor passed to the encoder.
    pub crf: u8,
    pub encoder: Encoder,
    /// Directory for PNG sequences, or a `.mp4` file.
    pub output: Option<PathBuf>,
    pub temporal_blur: TemporalBlurConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            framerate: 60,
            crf: 13,
            encoder: Encoder::X264,
            output: None,
            temporal_blur: TemporalBlurConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Renders averaged into each captured frame; 1 when temporal blur is off.
    pub fn blur_samples(&self) -> u32 {
        if self.temporal_blur.enabled {
            self.temporal_blur.samples.max(1)
        } else {
            1
        }
    }
}

/// Motion blur for captures: each frame is the mean of `samples` renders spread over its interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TemporalBlurConfig {
    pub enabled: bool,
    pub samples: u32,
}

impl Default for TemporalBlurConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            samples: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PresentationConfig {
    /// Restart from zero at the end instead of holding.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Seconds the last frame stays up before playback reports it is finished.
    pub hold_after_end: f64,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            looping: false,
            hold_after_end: 3.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ToolsConfig {
    pub bill_of_materials: bool,
    /// Also list assets nothing references.
    pub unused_materials: bool,
}

/// `config.json`: how the demo is played. Every field is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PlayerConfig {
    /// Demo root directory.
    pub demo: PathBuf,
    pub target: TargetConfig,
    pub capture: CaptureConfig,
    pub presentation: PresentationConfig,
    pub tools: ToolsConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            demo: PathBuf::from("."),
            target: TargetConfig::default(),
            capture: CaptureConfig::default(),
            presentation: PresentationConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl PlayerConfig {
    #[tracing::instrument(fields(file = %path.display()))]
    pub fn load(path: &Path) -> LayerplayResult<Self> {
        let cfg: Self = read_json(path)?;
        cfg.validate(path)?;
        Ok(cfg)
    }

    /// Validate values that serde cannot express; `origin` names the file in errors.
    pub fn validate(&self, origin: &Path) -> LayerplayResult<()> {
        if self.target.width == 0 || self.target.height == 0 {
            return Err(LayerplayError::config(
                origin,
                "target",
                "width and height must be > 0",
            ));
        }
        if self.capture.framerate == 0 {
            return Err(LayerplayError::config(
                origin,
                "capture.framerate",
                "must be > 0",
            ));
        }
        if self.capture.crf > 51 {
            return Err(LayerplayError::config(
                origin,
                "capture.crf",
                "must be in 0..=51",
            ));
        }
        if self.capture.temporal_blur.enabled && self.capture.temporal_blur.samples == 0 {
            return Err(LayerplayError::config(
                origin,
                "capture.temporal-blur.samples",
                "must be > 0",
            ));
        }
        if !self.presentation.hold_after_end.is_finite() || self.presentation.hold_after_end < 0.0
        {
            return Err(LayerplayError::config(
                origin,
                "presentation.hold-after-end",
                "must be a finite number >= 0",
            ));
        }
        Ok(())
    }

    pub fn paths(&self) -> DemoPaths {
        DemoPaths::new(&self.demo)
    }

    pub fn fps(&self) -> LayerplayResult<Fps> {
        Fps::new(self.capture.framerate, 1)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> LayerplayResult<T> {
    let bytes = std::fs::read(path)
        .map_err(|e| LayerplayError::config(path, "$", format!("read failed: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| LayerplayError::config(path, "$", format!("malformed JSON: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/demo.rs"]
mod tests;
