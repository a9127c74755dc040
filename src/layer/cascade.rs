//! "First present wins" merging of partially specified definitions.

use std::collections::BTreeMap;

use crate::layer::model::{AttributesDef, ClippingDef, ObjectDef, RepetitionsDef, SteppingDef};

/// Field-wise merge where `self` (the more specific value) wins over `lower`.
pub trait Cascade: Sized {
    fn over(self, lower: Self) -> Self;
}

/// Nested records cascade field by field; plain values fall back to `lower` only when absent.
fn over_nested<T: Cascade>(upper: Option<T>, lower: Option<T>) -> Option<T> {
    match (upper, lower) {
        (Some(u), Some(l)) => Some(u.over(l)),
        (u, l) => u.or(l),
    }
}

macro_rules! cascade_fields {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl Cascade for $ty {
            fn over(self, lower: Self) -> Self {
                Self {
                    $($field: self.$field.or(lower.$field)),+
                }
            }
        }
    };
}

cascade_fields!(ClippingDef { mask });
cascade_fields!(RepetitionsDef { count, interval });
cascade_fields!(SteppingDef { mode, steps, inertia });
cascade_fields!(AttributesDef {
    stroke_weight,
    stroke,
    fill
});

impl Cascade for ObjectDef {
    fn over(self, lower: Self) -> Self {
        let keyframer = match (self.keyframer, lower.keyframer) {
            (Some(mut upper), Some(lower)) => {
                upper.extend(lower);
                Some(upper)
            }
            (u, l) => u.or(l),
        };
        let properties = match (self.properties, lower.properties) {
            (Some(upper), Some(mut merged)) => {
                merged.extend(upper);
                Some(merged)
            }
            (u, l) => u.or(l),
        };
        Self {
            prototype: self.prototype.or(lower.prototype),
            time: self.time.or(lower.time),
            z_index: self.z_index.or(lower.z_index),
            kind: self.kind.or(lower.kind),
            target: self.target.or(lower.target),
            clipping: over_nested(self.clipping, lower.clipping),
            assets: self.assets.or(lower.assets),
            keyframer,
            repetitions: over_nested(self.repetitions, lower.repetitions),
            repetition_counter: self.repetition_counter.or(lower.repetition_counter),
            staggers: self.staggers.or(lower.staggers),
            stepping: over_nested(self.stepping, lower.stepping),
            attributes: over_nested(self.attributes, lower.attributes),
            properties,
        }
    }
}

/// Missing prototype reference found while building a cascade stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPrototype(pub String);

/// Fold `object` over its prototypes and the defaults.
///
/// Stack, lowest precedence first: defaults (with `layer_properties`), the `"*"` prototype, each
/// named prototype in reference order, then the object itself.
pub fn cascade_object(
    object: &ObjectDef,
    prototypes: &BTreeMap<String, ObjectDef>,
    layer_properties: &BTreeMap<String, f64>,
) -> Result<ObjectDef, MissingPrototype> {
    let mut resolved = ObjectDef::defaults(layer_properties);
    if let Some(wildcard) = prototypes.get("*") {
        resolved = wildcard.clone().over(resolved);
    }
    for name in object.prototype_names() {
        let proto = prototypes
            .get(name)
            .ok_or_else(|| MissingPrototype(name.to_string()))?;
        resolved = proto.clone().over(resolved);
    }
    Ok(object.clone().over(resolved))
}

#[cfg(test)]
#[path = "../../tests/unit/layer/cascade.rs"]
mod tests;
