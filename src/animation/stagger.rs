use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::seq::SliceRandom;

use crate::animation::ease::Ease;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::foundation::math::map_clamped;

/// How shapes of one object are spread over a stagger segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaggerMode {
    /// No staggering; every shape sees the object time.
    #[default]
    None,
    /// Shapes start one after another and all finish at the segment end.
    In,
    /// Shapes all start at the segment start and finish one after another.
    Out,
    /// Shapes occupy overlapping sub-windows of the segment.
    InOut,
}

/// Order in which shapes are assigned stagger slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaggerOrder {
    #[default]
    ContourIndex,
    ReverseContourIndex,
    /// Seeded shuffle.
    Random,
}

/// Authored stagger segment; its duration is derived when the object is resolved.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StaggerDef {
    pub time: f64,
    pub mode: StaggerMode,
    pub order: StaggerOrder,
    pub easing: String,
    pub seed: u64,
    pub window: f64,
}

impl Default for StaggerDef {
    fn default() -> Self {
        Self {
            time: 0.0,
            mode: StaggerMode::None,
            order: StaggerOrder::ContourIndex,
            easing: "linear".to_string(),
            seed: 100,
            window: 0.0,
        }
    }
}

/// A stagger segment with a concrete `[time, time + duration)` window.
#[derive(Clone, Debug, PartialEq)]
pub struct StaggerSegment {
    pub time: f64,
    pub duration: f64,
    pub mode: StaggerMode,
    pub order: StaggerOrder,
    pub easing: Ease,
    pub seed: u64,
    /// Overlap between neighbouring shape windows, in shape slots.
    pub window: f64,
}

impl StaggerSegment {
    pub fn end(&self) -> f64 {
        self.time + self.duration
    }

    /// Segment-local progress after easing, in the easing's output range.
    pub fn progress(&self, object_time: f64) -> f64 {
        let raw = if self.duration > 0.0 {
            ((object_time - self.time) / self.duration).clamp(0.0, 1.0)
        } else if object_time >= self.time {
            1.0
        } else {
            0.0
        };
        self.easing.apply(raw)
    }

    /// Effective sample time for the shape occupying stagger slot `slot` of `shape_count`.
    pub fn stagger(&self, object_time: f64, shape_count: usize, slot: usize) -> f64 {
        if self.mode == StaggerMode::None || shape_count == 0 {
            return object_time;
        }
        let (start, end) = shape_window(self.mode, shape_count, slot, self.window);
        map_clamped(
            self.progress(object_time),
            start,
            end,
            self.time,
            self.end(),
        )
    }
}

/// Normalized `[start, end]` window of slot `k` among `n` shapes with overlap `w`.
pub fn shape_window(mode: StaggerMode, n: usize, k: usize, w: f64) -> (f64, f64) {
    let denom = n as f64 + w;
    let start = k as f64 / denom;
    let end = (k as f64 + 1.0 + w) / denom;
    match mode {
        StaggerMode::None => (0.0, 1.0),
        StaggerMode::InOut => (start, end),
        StaggerMode::In => (start, 1.0),
        StaggerMode::Out => (0.0, end),
    }
}

/// Assign concrete durations to authored segments.
///
/// Each segment lasts until the next one starts; the last lasts until `animation_duration`.
/// An empty list becomes one non-staggered segment spanning the whole animation.
pub fn resolve_segments(
    defs: &[StaggerDef],
    animation_duration: f64,
) -> LayerplayResult<Vec<StaggerSegment>> {
    if defs.is_empty() {
        return Ok(vec![StaggerSegment {
            time: 0.0,
            duration: animation_duration,
            mode: StaggerMode::None,
            order: StaggerOrder::ContourIndex,
            easing: Ease::Linear,
            seed: 100,
            window: 0.0,
        }]);
    }

    let mut out = Vec::with_capacity(defs.len());
    for (i, def) in defs.iter().enumerate() {
        if let Some(next) = defs.get(i + 1)
            && next.time < def.time
        {
            return Err(LayerplayError::validation(format!(
                "staggers[{}] starts at {} before staggers[{i}] at {}; segments must be sorted",
                i + 1,
                next.time,
                def.time
            )));
        }
        if !def.window.is_finite() || def.window < 0.0 {
            return Err(LayerplayError::validation(format!(
                "staggers[{i}].window must be a non-negative number"
            )));
        }
        let end = defs.get(i + 1).map_or(animation_duration, |n| n.time);
        let easing = Ease::from_name(&def.easing)
            .map_err(|e| LayerplayError::validation(format!("staggers[{i}].easing: {e}")))?;
        out.push(StaggerSegment {
            time: def.time,
            duration: end - def.time,
            mode: def.mode,
            order: def.order,
            easing,
            seed: def.seed,
            window: def.window,
        });
    }
    Ok(out)
}

/// Segment governing `object_time`: first for times `<= 0`, last for times at or past the
/// last segment's start, otherwise the one whose window contains the time.
pub fn active_segment(segments: &[StaggerSegment], object_time: f64) -> Option<&StaggerSegment> {
    let first = segments.first()?;
    let last = segments.last()?;
    if object_time <= 0.0 {
        return Some(first);
    }
    if object_time >= last.time {
        return Some(last);
    }
    segments
        .iter()
        .find(|s| s.time <= object_time && object_time < s.end())
        .or(Some(last))
}

/// Shape-index permutations keyed by `(order, seed, shape count)`.
///
/// Owned by the frame compiler and dropped wholesale with the snapshot it was built for.
#[derive(Debug, Default)]
pub struct ShapeOrderCache {
    perms: HashMap<(StaggerOrder, u64, usize), Arc<[usize]>>,
}

impl ShapeOrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `perm[shape_index]` is the stagger slot of that shape.
    pub fn permutation(&mut self, order: StaggerOrder, seed: u64, count: usize) -> Arc<[usize]> {
        let key = match order {
            StaggerOrder::Random => (order, seed, count),
            // Seed is irrelevant for deterministic orders.
            _ => (order, 0, count),
        };
        self.perms
            .entry(key)
            .or_insert_with(|| shape_permutation(order, seed, count).into())
            .clone()
    }

    pub fn clear(&mut self) {
        self.perms.clear();
    }

    pub fn len(&self) -> usize {
        self.perms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perms.is_empty()
    }
}

pub fn shape_permutation(order: StaggerOrder, seed: u64, count: usize) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..count).collect();
    match order {
        StaggerOrder::ContourIndex => {}
        StaggerOrder::ReverseContourIndex => perm.reverse(),
        StaggerOrder::Random => {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            perm.shuffle(&mut rng);
        }
    }
    perm
}

/// Per-shape sample time for `shape_index` of `shape_count` at `object_time`.
pub fn stagger_time(
    segments: &[StaggerSegment],
    orders: &mut ShapeOrderCache,
    object_time: f64,
    shape_count: usize,
    shape_index: usize,
) -> f64 {
    let Some(seg) = active_segment(segments, object_time) else {
        return object_time;
    };
    if seg.mode == StaggerMode::None {
        return object_time;
    }
    let perm = orders.permutation(seg.order, seg.seed, shape_count);
    let slot = perm.get(shape_index).copied().unwrap_or(shape_index);
    seg.stagger(object_time, shape_count, slot)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/stagger.rs"]
mod tests;
