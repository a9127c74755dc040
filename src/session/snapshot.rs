use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Context;

use crate::assets::AssetCache;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::layer::{ResolvedLayer, load_layer};

/// Immutable view of every published layer, taken once per frame.
#[derive(Clone, Debug, Default)]
pub struct DemoSnapshot {
    layers: Arc<[Arc<ResolvedLayer>]>,
}

impl DemoSnapshot {
    pub fn new(layers: Vec<Arc<ResolvedLayer>>) -> Self {
        Self {
            layers: layers.into(),
        }
    }

    /// Layers ordered by file path.
    pub fn layers(&self) -> &[Arc<ResolvedLayer>] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, file: &Path) -> Option<&Arc<ResolvedLayer>> {
        self.layers.iter().find(|l| l.file == file)
    }

    /// Resolved object count across all layers.
    pub fn object_count(&self) -> usize {
        self.layers.iter().map(|l| l.objects.len()).sum()
    }

    /// Latest end time of any object, in animation time.
    pub fn end_time(&self) -> f64 {
        self.layers
            .iter()
            .flat_map(|l| l.objects.iter())
            .map(|o| o.time + o.duration())
            .fold(0.0, f64::max)
    }
}

/// What happened to a layer file after a reload attempt.
#[derive(Clone, Debug)]
pub enum ReloadOutcome {
    Published(Arc<ResolvedLayer>),
    /// The previous snapshot stays in effect.
    Rejected(Arc<LayerplayError>),
    Removed,
}

/// Currently published layers, one per file.
///
/// Each entry is replaced wholesale; readers clone the `Arc`s under the read lock and never see a
/// layer that is still being resolved.
#[derive(Debug)]
pub struct LayerStore {
    assets_root: PathBuf,
    layers: RwLock<BTreeMap<PathBuf, Arc<ResolvedLayer>>>,
}

impl LayerStore {
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            layers: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    pub fn snapshot(&self) -> DemoSnapshot {
        match self.layers.read() {
            Ok(map) => DemoSnapshot::new(map.values().cloned().collect()),
            Err(poisoned) => DemoSnapshot::new(poisoned.into_inner().values().cloned().collect()),
        }
    }

    /// Load every `.json` layer file in `dir`; the first failure aborts the load.
    #[tracing::instrument(skip(self, cache), fields(dir = %dir.display()))]
    pub fn load_dir(&self, dir: &Path, cache: &AssetCache) -> LayerplayResult<DemoSnapshot> {
        for file in discover_layer_files(dir)? {
            self.reload(&file, cache)?;
        }
        let snapshot = self.snapshot();
        tracing::info!(layers = snapshot.len(), "loaded demo layers");
        Ok(snapshot)
    }

    /// Resolve `file` and its assets, then publish it.
    ///
    /// Nothing is published on failure. Assets of the previous version are evicted first so that
    /// edited asset files are decoded again.
    pub fn reload(&self, file: &Path, cache: &AssetCache) -> LayerplayResult<Arc<ResolvedLayer>> {
        let layer = load_layer(file, &self.assets_root)?;
        if let Some(previous) = self.get(file) {
            cache.evict_layer(&previous);
        }
        cache.evict_layer(&layer);
        cache.preload_layer(&layer)?;

        let layer = Arc::new(layer);
        self.write()?.insert(file.to_path_buf(), Arc::clone(&layer));
        Ok(layer)
    }

    /// Reload `file` and log the outcome instead of failing.
    pub fn apply_change(&self, file: &Path, cache: &AssetCache) -> ReloadOutcome {
        match self.reload(file, cache) {
            Ok(layer) => {
                tracing::info!(
                    file = %file.display(),
                    objects = layer.objects.len(),
                    "published layer snapshot"
                );
                ReloadOutcome::Published(layer)
            }
            Err(err) => {
                tracing::error!(
                    file = %file.display(),
                    error = %err,
                    "layer reload rejected; keeping previous snapshot"
                );
                ReloadOutcome::Rejected(Arc::new(err))
            }
        }
    }

    /// Drop the layer loaded from `file`.
    pub fn remove(&self, file: &Path, cache: &AssetCache) -> ReloadOutcome {
        let removed = self.write().ok().and_then(|mut map| map.remove(file));
        if let Some(layer) = removed {
            cache.evict_layer(&layer);
            tracing::info!(file = %file.display(), "removed layer");
        }
        ReloadOutcome::Removed
    }

    pub fn get(&self, file: &Path) -> Option<Arc<ResolvedLayer>> {
        self.layers.read().ok()?.get(file).cloned()
    }

    fn write(
        &self,
    ) -> LayerplayResult<std::sync::RwLockWriteGuard<'_, BTreeMap<PathBuf, Arc<ResolvedLayer>>>>
    {
        self.layers
            .write()
            .map_err(|_| LayerplayError::evaluation("layer store lock poisoned"))
    }
}

/// `.json` files directly inside `dir`, sorted by path.
pub fn discover_layer_files(dir: &Path) -> LayerplayResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("list layer directory '{}'", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("list layer directory '{}'", dir.display()))?
            .path();
        if is_layer_file(&path) && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn is_layer_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
#[path = "../../tests/unit/session/snapshot.rs"]
mod tests;
