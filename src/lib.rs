//! Layerplay is a real-time layered demo player core.
//!
//! A demo is a directory of JSON layer files plus assets. Each layer is resolved once per reload
//! (prototype cascade, repetition flattening, keyframe loading) into an immutable snapshot, and
//! every frame is compiled from the current snapshot into an explicit render plan that a backend
//! executes:
//!
//! - Load a demo with [`Player::open`]
//! - Render frames with [`Player::render_at`] / [`Player::render_frame`]
//! - Keep editing: [`Player::watch`] + [`Player::pump_reloads`] pick up saved layer files
//! - Capture a frame range into a [`FrameSink`] with [`Player::capture`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
/// Asset path expansion, decoding, and caching.
pub mod assets;
/// Per-frame render plan compilation.
pub mod compile;
/// Capture sinks.
pub mod encode;
pub(crate) mod expression;
/// Layer files: authored model and resolution.
pub mod layer;
/// Render plan execution.
pub mod render;
/// Demo configuration, snapshots, reload, and playback.
pub mod session;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Fps, Point, Rect, Rgba, Vec2};
pub use crate::foundation::error::{LayerplayError, LayerplayResult};

pub use crate::assets::AssetCache;
pub use crate::compile::{FrameCompiler, RenderPlan};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInput, FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use crate::encode::sink_for_output;
pub use crate::layer::{ResolvedLayer, load_layer};
pub use crate::render::{BackendKind, Frame, FrameRGBA, RenderBackend, create_backend};
pub use crate::session::{
    AudioChannel, BillOfMaterials, CaptureOpts, CaptureStats, ClockChannel, DemoConfig,
    DemoSnapshot, FrameClock, LayerStore, LayerWatcher, PlaybackState, Player, PlayerConfig,
    ReloadEvent, ReloadOutcome, bill_of_materials, unused_materials,
};
