use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::foundation::error::LayerplayResult;
use crate::session::snapshot::discover_layer_files;

/// A layer file changed on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Created or modified.
    Changed(PathBuf),
    Removed(PathBuf),
}

impl ReloadEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Changed(p) | Self::Removed(p) => p,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

/// Compares successive listings of a layer directory.
#[derive(Debug)]
pub struct DirScanner {
    dir: PathBuf,
    seen: BTreeMap<PathBuf, FileStamp>,
}

impl DirScanner {
    /// Scanner whose baseline is the directory's current contents.
    pub fn new(dir: impl Into<PathBuf>) -> LayerplayResult<Self> {
        let mut scanner = Self {
            dir: dir.into(),
            seen: BTreeMap::new(),
        };
        scanner.seen = scanner.stamps()?;
        Ok(scanner)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Events since the previous scan, in path order.
    pub fn scan(&mut self) -> LayerplayResult<Vec<ReloadEvent>> {
        let now = self.stamps()?;
        let mut events = Vec::new();
        for (path, stamp) in &now {
            if self.seen.get(path) != Some(stamp) {
                events.push(ReloadEvent::Changed(path.clone()));
            }
        }
        for path in self.seen.keys() {
            if !now.contains_key(path) {
                events.push(ReloadEvent::Removed(path.clone()));
            }
        }
        events.sort_by(|a, b| a.path().cmp(b.path()));
        self.seen = now;
        Ok(events)
    }

    fn stamps(&self) -> LayerplayResult<BTreeMap<PathBuf, FileStamp>> {
        let mut out = BTreeMap::new();
        for path in discover_layer_files(&self.dir)? {
            // Files can vanish between listing and stat; the next scan reports them.
            let Ok(meta) = std::fs::metadata(&path) else {
                continue;
            };
            out.insert(
                path,
                FileStamp {
                    modified: meta.modified().ok(),
                    len: meta.len(),
                },
            );
        }
        Ok(out)
    }
}

/// Background thread polling a layer directory.
///
/// Events arrive on [`LayerWatcher::events`]; dropping the watcher stops and joins the thread.
pub struct LayerWatcher {
    events: Receiver<ReloadEvent>,
    stop: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LayerWatcher {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);

    #[tracing::instrument(fields(dir = %dir.display()))]
    pub fn spawn(dir: &Path, interval: Duration) -> LayerplayResult<Self> {
        let mut scanner = DirScanner::new(dir)?;
        let (tx, events) = crossbeam_channel::unbounded();
        let (stop, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("layerplay-watcher".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        _ => break,
                    }
                    let batch = match scanner.scan() {
                        Ok(batch) => batch,
                        Err(err) => {
                            tracing::warn!(dir = %scanner.dir().display(), error = %err, "layer scan failed");
                            continue;
                        }
                    };
                    for event in batch {
                        tracing::debug!(?event, "layer file event");
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                tracing::trace!("watcher stopped");
            })
            .context("spawn layer watcher thread")?;

        Ok(Self {
            events,
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn events(&self) -> &Receiver<ReloadEvent> {
        &self.events
    }

    /// Every event queued so far, without blocking.
    pub fn drain(&self) -> Vec<ReloadEvent> {
        self.events.try_iter().collect()
    }
}

impl Drop for LayerWatcher {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/watcher.rs"]
mod tests;
