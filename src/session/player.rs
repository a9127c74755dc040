use std::path::Path;
use std::time::Duration;

use crate::assets::AssetCache;
use crate::assets::store::asset_error;
use crate::compile::{FontRef, FrameCompiler, FrameInputs};
use crate::foundation::core::Canvas;
use crate::foundation::error::LayerplayResult;
use crate::render::{Frame, RenderBackend};
use crate::session::audio::AudioChannel;
use crate::session::bom::{BillOfMaterials, bill_of_materials};
use crate::session::demo::{DemoConfig, DemoPaths, PlayerConfig, PresentationConfig};
use crate::session::snapshot::{DemoSnapshot, LayerStore, ReloadOutcome};
use crate::session::watcher::{LayerWatcher, ReloadEvent};

/// Where playback stands relative to the end of the demo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    /// Past the end, showing the last frame for `hold-after-end` seconds.
    Holding,
    Finished,
}

/// A loaded demo bound to a renderer and a playback channel.
pub struct Player {
    paths: DemoPaths,
    demo: DemoConfig,
    presentation: PresentationConfig,
    canvas: Canvas,
    store: LayerStore,
    assets: AssetCache,
    font: Option<FontRef>,
    compiler: FrameCompiler,
    backend: Box<dyn RenderBackend>,
    channel: Box<dyn AudioChannel>,
    watcher: Option<LayerWatcher>,
    /// Animation time playback jumps back to after every published reload.
    cue_point: Option<f64>,
}

impl Player {
    /// Load `demo.json` and every layer of the demo `cfg` points at.
    #[tracing::instrument(skip_all, fields(demo = %cfg.demo.display()))]
    pub fn open(
        cfg: &PlayerConfig,
        backend: Box<dyn RenderBackend>,
        channel: Box<dyn AudioChannel>,
    ) -> LayerplayResult<Self> {
        let paths = cfg.paths();
        let demo = DemoConfig::load(&paths.demo_file())?;
        let assets = AssetCache::new(paths.assets());
        let store = LayerStore::new(paths.assets());
        store.load_dir(&paths.animations(), &assets)?;

        let font = match &demo.font {
            Some(rel) => Some(FontRef {
                key: rel.clone(),
                bytes: assets
                    .font(rel)
                    .map_err(|e| asset_error(rel, &paths.demo_file(), "font", e))?,
            }),
            None => None,
        };

        tracing::info!(title = %demo.title, duration = demo.duration, "opened demo");
        Ok(Self {
            paths,
            demo,
            presentation: cfg.presentation.clone(),
            canvas: cfg.target.canvas(),
            store,
            assets,
            font,
            compiler: FrameCompiler::new(),
            backend,
            channel,
            watcher: None,
            cue_point: None,
        })
    }

    pub fn demo(&self) -> &DemoConfig {
        &self.demo
    }

    pub fn paths(&self) -> &DemoPaths {
        &self.paths
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn snapshot(&self) -> DemoSnapshot {
        self.store.snapshot()
    }

    pub fn channel(&self) -> &dyn AudioChannel {
        self.channel.as_ref()
    }

    pub fn bill_of_materials(&self) -> BillOfMaterials {
        bill_of_materials(&self.snapshot(), &self.demo, &self.paths.root)
    }

    /// Start polling the animations directory; reloads are applied by [`Player::pump_reloads`].
    pub fn watch(&mut self, interval: Duration) -> LayerplayResult<()> {
        self.watcher = Some(LayerWatcher::spawn(&self.paths.animations(), interval)?);
        Ok(())
    }

    /// Apply every queued file event. A rejected reload leaves the previous layer in place.
    pub fn pump_reloads(&mut self) -> Vec<ReloadOutcome> {
        let events = match &self.watcher {
            Some(w) => w.drain(),
            None => return Vec::new(),
        };
        events.iter().map(|e| self.apply_event(e)).collect()
    }

    pub fn apply_event(&mut self, event: &ReloadEvent) -> ReloadOutcome {
        let outcome = match event {
            ReloadEvent::Changed(file) => self.store.apply_change(file, &self.assets),
            ReloadEvent::Removed(file) => self.store.remove(file, &self.assets),
        };
        if !matches!(outcome, ReloadOutcome::Rejected(_)) {
            self.compiler.reset();
            self.backend.clear_caches();
            self.jump_to_cue();
        }
        outcome
    }

    /// Reload one layer file by path.
    pub fn reload(&mut self, file: &Path) -> ReloadOutcome {
        self.apply_event(&ReloadEvent::Changed(file.to_path_buf()))
    }

    /// Render at an animation time.
    #[tracing::instrument(skip(self))]
    pub fn render_at(&mut self, time: f64) -> LayerplayResult<Frame> {
        let snapshot = self.store.snapshot();
        let plan = self.compiler.compile(&FrameInputs {
            layers: snapshot.layers(),
            time,
            canvas: self.canvas,
            assets: &self.assets,
            font: self.font.as_ref(),
        })?;
        self.backend.render_plan(&plan)
    }

    /// Render at the channel's current position.
    pub fn render_frame(&mut self) -> LayerplayResult<Frame> {
        let time = self.current_time();
        self.render_at(time)
    }

    /// Animation time for the channel position, held at the end when not looping.
    pub fn current_time(&self) -> f64 {
        let mut position = self.channel.position();
        if !self.presentation.looping && self.demo.duration > 0.0 {
            position = position.min(self.demo.duration);
        }
        self.demo.animation_time(position)
    }

    /// Wrap around or hold at the end, per the presentation settings.
    pub fn update(&mut self) -> PlaybackState {
        let duration = self.demo.duration;
        let position = self.channel.position();
        if duration <= 0.0 || position < duration {
            return PlaybackState::Playing;
        }
        if self.presentation.looping {
            self.channel.set_position(position % duration);
            return PlaybackState::Playing;
        }
        if position - duration < self.presentation.hold_after_end {
            PlaybackState::Holding
        } else {
            if !self.channel.is_paused() {
                self.channel.pause();
            }
            PlaybackState::Finished
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        self.channel.set_position(seconds.max(0.0));
    }

    pub fn cue_point(&self) -> Option<f64> {
        self.cue_point
    }

    /// Set or clear the cue point, in animation time.
    pub fn set_cue_point(&mut self, time: Option<f64>) {
        self.cue_point = time.filter(|t| t.is_finite()).map(|t| t.max(0.0));
    }

    /// Cue the current animation time.
    pub fn mark_cue_point(&mut self) {
        self.set_cue_point(Some(self.current_time()));
    }

    /// Seek to the cue point, if one is set.
    pub fn jump_to_cue(&mut self) {
        if let Some(time) = self.cue_point {
            tracing::debug!(time, "jumping to cue point");
            self.seek(self.demo.audio_time(time));
        }
    }

    /// Returns `true` when playback is now paused.
    pub fn toggle_pause(&mut self) -> bool {
        if self.channel.is_paused() {
            self.channel.resume();
        } else {
            self.channel.pause();
        }
        self.channel.is_paused()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/player.rs"]
mod tests;
