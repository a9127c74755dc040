use crate::foundation::core::Rgba;
use crate::layer::model::AttributeSource;

/// Resolve a color attribute from the animated value and the asset's authored style.
///
/// An asset with no authored color counts as transparent.
pub fn resolve_color(source: AttributeSource, animated: Rgba, asset: Option<Rgba>) -> Rgba {
    match source {
        AttributeSource::User => animated,
        AttributeSource::Asset => asset.unwrap_or(Rgba::TRANSPARENT),
        AttributeSource::Modulate => animated.modulate(asset.unwrap_or(Rgba::TRANSPARENT)),
    }
}

/// Resolve the stroke weight.
///
/// A missing authored weight counts as `0` when used directly and as `1` when modulating.
pub fn resolve_weight(source: AttributeSource, animated: f64, asset: Option<f64>) -> f64 {
    match source {
        AttributeSource::User => animated,
        AttributeSource::Asset => asset.unwrap_or(0.0),
        AttributeSource::Modulate => animated * asset.unwrap_or(1.0),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/attributes.rs"]
mod tests;
