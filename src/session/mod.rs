//! Playback session: demo configuration, published layer snapshots, reload plumbing, the audio
//! clock, and the [`Player`] that ties them to a render backend.

pub mod audio;
pub mod bom;
pub mod capture;
pub mod demo;
pub mod player;
pub mod snapshot;
pub mod watcher;

pub use audio::{AudioChannel, ClockChannel, FrameClock};
pub use bom::{BillOfMaterials, bill_of_materials, unused_materials};
pub use capture::{CaptureOpts, CaptureStats};
pub use demo::{DemoConfig, DemoPaths, Encoder, PlayerConfig, TemporalBlurConfig};
pub use player::{PlaybackState, Player};
pub use snapshot::{DemoSnapshot, LayerStore, ReloadOutcome};
pub use watcher::{LayerWatcher, ReloadEvent};
