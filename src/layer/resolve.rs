use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::animation::keyframer::Animation;
use crate::animation::stagger::{StaggerSegment, resolve_segments};
use crate::animation::stepping::Stepping;
use crate::assets::wildcard::expand_patterns;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::layer::model::{
    AttributeSource, ClipMask, ObjectDef, ObjectKind, RenderTarget, RepetitionsDef,
};

/// Per-attribute value sources of a resolved object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attributes {
    pub stroke_weight: AttributeSource,
    pub stroke: AttributeSource,
    pub fill: AttributeSource,
}

/// Repetition descriptor after flattening; `count` is always 1 on resolved objects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repetitions {
    pub count: u32,
    pub interval: f64,
}

/// Fully specified object: every cascaded field present, assets expanded, stagger segments timed.
#[derive(Clone, Debug)]
pub struct ResolvedObject {
    /// Position in the layer's flattened object list; breaks z-index ties.
    pub index: usize,
    /// Index of the authored object this instance came from.
    pub source_index: usize,
    pub prototype: String,
    pub time: f64,
    pub z_index: i32,
    pub kind: ObjectKind,
    pub target: RenderTarget,
    pub clip_mask: ClipMask,
    /// Concrete asset paths relative to the assets root.
    pub assets: Vec<String>,
    pub animation: Arc<Animation>,
    pub repetitions: Repetitions,
    /// Repetition index `k` of this instance, exposed to expressions as `rep`.
    pub repetition: u32,
    pub staggers: Vec<StaggerSegment>,
    pub stepping: Stepping,
    pub attributes: Attributes,
    pub properties: BTreeMap<String, f64>,
}

impl ResolvedObject {
    /// Equal to the animation's total duration.
    pub fn duration(&self) -> f64 {
        self.animation.duration()
    }

    /// `true` inside the half-open window `[time, time + duration)`.
    pub fn is_active(&self, t: f64) -> bool {
        t >= self.time && t < self.time + self.duration()
    }

    /// Short identification used in asset error messages.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "objects[{}] type={} time={}",
            self.source_index,
            self.kind.as_str(),
            self.time
        );
        if !self.prototype.is_empty() {
            out.push_str(&format!(" prototype='{}'", self.prototype));
        }
        if self.repetition > 0 {
            out.push_str(&format!(" rep={}", self.repetition));
        }
        out
    }
}

/// Location of an object inside its layer file.
#[derive(Clone, Copy, Debug)]
pub struct ObjectSite<'a> {
    pub file: &'a Path,
    pub assets_root: &'a Path,
    pub source_index: usize,
}

impl ObjectSite<'_> {
    fn field(&self, name: &str) -> String {
        format!("objects[{}].{name}", self.source_index)
    }
}

/// Expand a cascaded object into one definition per repetition.
///
/// Instance `k` starts at `time + k * interval`, carries `repetition_counter = k`, and has its
/// repetition count forced to 1.
pub fn flatten_repetitions(def: ObjectDef) -> Vec<ObjectDef> {
    let reps = def.repetitions.clone().unwrap_or_default();
    let count = reps.count.unwrap_or(1);
    let interval = reps.interval.unwrap_or(0.0);
    let base = def.time.unwrap_or(0.0);

    (0..count)
        .map(|k| {
            let mut inst = def.clone();
            inst.time = Some(base + f64::from(k) * interval);
            inst.repetition_counter = Some(k);
            inst.repetitions = Some(RepetitionsDef {
                count: Some(1),
                interval: Some(0.0),
            });
            inst
        })
        .collect()
}

fn required<T>(value: Option<T>, site: &ObjectSite<'_>, name: &str) -> LayerplayResult<T> {
    value.ok_or_else(|| {
        LayerplayError::config(site.file, site.field(name), "unresolved default field")
    })
}

/// Turn one flattened definition into a [`ResolvedObject`].
///
/// Expands asset wildcards, loads the animation with `rep` injected into the property map, and
/// assigns stagger segment durations.
pub fn finish(def: ObjectDef, site: &ObjectSite<'_>, index: usize) -> LayerplayResult<ResolvedObject> {
    let prototype = required(def.prototype, site, "prototype")?;
    let time = required(def.time, site, "time")?;
    let z_index = required(def.z_index, site, "z-index")?;
    let kind = required(def.kind, site, "type")?;
    let target = required(def.target, site, "target")?;
    let clipping = required(def.clipping, site, "clipping")?;
    let clip_mask = required(clipping.mask, site, "clipping.mask")?;
    let patterns = required(def.assets, site, "assets")?;
    let keyframer = required(def.keyframer, site, "keyframer")?;
    let reps = required(def.repetitions, site, "repetitions")?;
    let repetitions = Repetitions {
        count: required(reps.count, site, "repetitions.count")?,
        interval: required(reps.interval, site, "repetitions.interval")?,
    };
    let repetition = required(def.repetition_counter, site, "repetition-counter")?;
    let stagger_defs = required(def.staggers, site, "staggers")?;
    let stepping_def = required(def.stepping, site, "stepping")?;
    let stepping = Stepping {
        mode: required(stepping_def.mode, site, "stepping.mode")?,
        steps: required(stepping_def.steps, site, "stepping.steps")?,
        inertia: required(stepping_def.inertia, site, "stepping.inertia")?,
    };
    let attrs = required(def.attributes, site, "attributes")?;
    let attributes = Attributes {
        stroke_weight: required(attrs.stroke_weight, site, "attributes.stroke-weight")?,
        stroke: required(attrs.stroke, site, "attributes.stroke")?,
        fill: required(attrs.fill, site, "attributes.fill")?,
    };
    let mut properties = required(def.properties, site, "properties")?;
    properties.insert("rep".to_string(), f64::from(repetition));

    let assets = expand_patterns(&patterns, site.assets_root)
        .map_err(|e| e.at(site.file, site.field("assets")))?;
    if assets.is_empty() {
        return Err(LayerplayError::asset(
            patterns.join(", "),
            site.file,
            format!("objects[{}] type={}", site.source_index, kind.as_str()),
            "asset list is empty after wildcard expansion",
        ));
    }

    let animation = Animation::load(&keyframer, &properties)
        .map_err(|e| e.at(site.file, site.field("keyframer")))?;
    let staggers = resolve_segments(&stagger_defs, animation.duration())
        .map_err(|e| e.at(site.file, site.field("staggers")))?;

    Ok(ResolvedObject {
        index,
        source_index: site.source_index,
        prototype,
        time,
        z_index,
        kind,
        target,
        clip_mask,
        assets,
        animation: Arc::new(animation),
        repetitions,
        repetition,
        staggers,
        stepping,
        attributes,
        properties,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layer/resolve.rs"]
mod tests;
