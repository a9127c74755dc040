use std::collections::BTreeMap;

use crate::animation::ease::Ease;
use crate::expression::{self, eval::Layered, eval::Scope};
use crate::foundation::core::Rgba;
use crate::foundation::error::{LayerplayError, LayerplayResult};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Key {
    time: f64,
    value: f64,
    /// Easing of the segment that ends at this key.
    ease: Ease,
}

/// Loaded keyframe animation: a set of named scalar channels with a shared duration.
///
/// Keys are given as JSON objects; `time` (absolute) or `duration` (relative to the previous key)
/// place the key, `easing` names the curve of the segment ending at it, and every other member is
/// a channel value (number or expression string).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animation {
    channels: BTreeMap<String, Vec<Key>>,
    duration: f64,
}

impl Animation {
    /// Build an animation from raw key objects, evaluating expressions against `properties`.
    ///
    /// Keys that share a time on the same channel keep the first-listed value.
    pub fn load(
        keys: &[serde_json::Value],
        properties: &BTreeMap<String, f64>,
    ) -> LayerplayResult<Self> {
        let mut channels = BTreeMap::<String, Vec<Key>>::new();
        let mut prev_time = 0.0f64;
        let mut duration = 0.0f64;

        for (idx, raw) in keys.iter().enumerate() {
            let obj = raw.as_object().ok_or_else(|| {
                LayerplayError::animation(format!("key {idx} must be a JSON object"))
            })?;

            let time = match (obj.get("time"), obj.get("duration")) {
                (Some(_), Some(_)) => {
                    return Err(LayerplayError::animation(format!(
                        "key {idx} may carry either 'time' or 'duration', not both"
                    )));
                }
                (Some(t), None) => scalar(t, properties, prev_time, 0.0)
                    .map_err(|e| LayerplayError::animation(format!("key {idx} time: {e}")))?,
                (None, Some(d)) => {
                    let d = scalar(d, properties, prev_time, 0.0).map_err(|e| {
                        LayerplayError::animation(format!("key {idx} duration: {e}"))
                    })?;
                    prev_time + d
                }
                (None, None) => prev_time,
            };
            if !time.is_finite() {
                return Err(LayerplayError::animation(format!(
                    "key {idx} time is not finite"
                )));
            }

            let ease = match obj.get("easing") {
                None => Ease::Linear,
                Some(serde_json::Value::String(name)) => Ease::from_name(name)
                    .map_err(|e| LayerplayError::animation(format!("key {idx} easing: {e}")))?,
                Some(other) => {
                    return Err(LayerplayError::animation(format!(
                        "key {idx} easing must be a string, got {other}"
                    )));
                }
            };

            for (name, raw_value) in obj {
                if matches!(name.as_str(), "time" | "duration" | "easing") {
                    continue;
                }
                let track = channels.entry(name.clone()).or_default();
                let prev_value = track.last().map(|k| k.value).unwrap_or(0.0);
                let value = scalar(raw_value, properties, time, prev_value).map_err(|e| {
                    LayerplayError::animation(format!("key {idx} channel '{name}': {e}"))
                })?;
                track.push(Key { time, value, ease });
            }

            duration = duration.max(time);
            prev_time = time;
        }

        for track in channels.values_mut() {
            // Stable sort keeps the first-listed key first among equal times.
            track.sort_by(|a, b| a.time.total_cmp(&b.time));
            track.dedup_by(|later, earlier| later.time == earlier.time);
        }

        Ok(Self { channels, duration })
    }

    /// Total duration: the latest key time across all keys.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Sample every channel at `time`.
    pub fn sample(&self, time: f64) -> ChannelValues<'_> {
        ChannelValues { anim: self, time }
    }

    fn value_at(&self, channel: &str, time: f64) -> Option<f64> {
        let keys = self.channels.get(channel)?;
        let first = keys.first()?;
        let last = keys.last()?;
        if keys.len() == 1 || time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }
        // First key strictly after `time`; its left neighbour starts the segment.
        let right = keys.partition_point(|k| k.time <= time);
        let (k0, k1) = (&keys[right - 1], &keys[right]);
        let span = k1.time - k0.time;
        let p = if span > 0.0 {
            (time - k0.time) / span
        } else {
            1.0
        };
        Some(k0.value + (k1.value - k0.value) * k1.ease.apply(p))
    }
}

/// Channel values of an [`Animation`] at one instant.
#[derive(Clone, Copy, Debug)]
pub struct ChannelValues<'a> {
    anim: &'a Animation,
    time: f64,
}

impl ChannelValues<'_> {
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Value of `channel`, or `default` when the animation never keys it.
    pub fn value(&self, channel: &str, default: f64) -> f64 {
        self.anim.value_at(channel, self.time).unwrap_or(default)
    }

    /// Color assembled from `<prefix>-r`, `-g`, `-b`, `-a` channels.
    pub fn color(&self, prefix: &str, default: Rgba) -> Rgba {
        Rgba::new(
            self.value(&format!("{prefix}-r"), default.r),
            self.value(&format!("{prefix}-g"), default.g),
            self.value(&format!("{prefix}-b"), default.b),
            self.value(&format!("{prefix}-a"), default.a),
        )
    }
}

fn scalar(
    raw: &serde_json::Value,
    properties: &BTreeMap<String, f64>,
    t: f64,
    v: f64,
) -> Result<f64, String> {
    match raw {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("number {n} is not representable as f64")),
        serde_json::Value::String(src) => {
            let extra = [("t", t), ("v", v)];
            let scope = Layered {
                base: properties as &dyn Scope,
                extra: &extra,
            };
            expression::evaluate(src, &scope).map_err(|e| format!("'{src}': {e}"))
        }
        serde_json::Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(format!("expected a number or expression, got {other}")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframer.rs"]
mod tests;
