use std::f64::consts::PI;

use crate::foundation::error::{LayerplayError, LayerplayResult};

/// Direction variant of an easing family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EaseDir {
    /// Accelerating from zero velocity.
    In,
    /// Decelerating to zero velocity.
    Out,
    /// Accelerating until halfway, then decelerating.
    InOut,
}

/// Named easing curve family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EaseFamily {
    /// Overshooting cubic.
    Back,
    /// Bouncing ball.
    Bounce,
    /// Circular arc.
    Circ,
    /// `t^3`.
    Cubic,
    /// Damped sine.
    Elastic,
    /// Exponential.
    Expo,
    /// `t^2`.
    Quad,
    /// `t^4`.
    Quart,
    /// `t^5`.
    Quint,
    /// Quarter sine.
    Sine,
}

/// Easing functions used to map normalized animation progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Ease {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Always `0`: holds the segment start value.
    Zero,
    /// Always `1`: jumps to the segment end value.
    One,
    /// A directional curve from one of the named families.
    Curve(EaseFamily, EaseDir),
}

const FAMILIES: [(&str, EaseFamily); 10] = [
    ("back", EaseFamily::Back),
    ("bounce", EaseFamily::Bounce),
    ("circ", EaseFamily::Circ),
    ("cubic", EaseFamily::Cubic),
    ("elastic", EaseFamily::Elastic),
    ("expo", EaseFamily::Expo),
    ("quad", EaseFamily::Quad),
    ("quart", EaseFamily::Quart),
    ("quint", EaseFamily::Quint),
    ("sine", EaseFamily::Sine),
];

impl Ease {
    /// Look up an easing by its kebab-case name, e.g. `cubic-in-out` or `linear`.
    pub fn from_name(name: &str) -> LayerplayResult<Self> {
        match name {
            "linear" => return Ok(Self::Linear),
            "zero" => return Ok(Self::Zero),
            "one" => return Ok(Self::One),
            _ => {}
        }
        let (family, dir) = if let Some(f) = name.strip_suffix("-in-out") {
            (f, EaseDir::InOut)
        } else if let Some(f) = name.strip_suffix("-in") {
            (f, EaseDir::In)
        } else if let Some(f) = name.strip_suffix("-out") {
            (f, EaseDir::Out)
        } else {
            return Err(LayerplayError::validation(format!(
                "unknown easing '{name}'"
            )));
        };
        FAMILIES
            .iter()
            .find(|(n, _)| *n == family)
            .map(|(_, fam)| Self::Curve(*fam, dir))
            .ok_or_else(|| LayerplayError::validation(format!("unknown easing '{name}'")))
    }

    /// Canonical kebab-case name; inverse of [`Ease::from_name`].
    pub fn name(self) -> String {
        match self {
            Self::Linear => "linear".to_string(),
            Self::Zero => "zero".to_string(),
            Self::One => "one".to_string(),
            Self::Curve(family, dir) => {
                let fam = FAMILIES
                    .iter()
                    .find(|(_, f)| *f == family)
                    .map(|(n, _)| *n)
                    .unwrap_or("linear");
                let suffix = match dir {
                    EaseDir::In => "in",
                    EaseDir::Out => "out",
                    EaseDir::InOut => "in-out",
                };
                format!("{fam}-{suffix}")
            }
        }
    }

    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    ///
    /// `back` and `elastic` overshoot; their output may leave `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Zero => 0.0,
            Self::One => 1.0,
            Self::Curve(family, EaseDir::In) => ease_in(family, t),
            Self::Curve(family, EaseDir::Out) => 1.0 - ease_in(family, 1.0 - t),
            Self::Curve(family, EaseDir::InOut) => {
                if t < 0.5 {
                    ease_in(family, 2.0 * t) / 2.0
                } else {
                    1.0 - ease_in(family, 2.0 - 2.0 * t) / 2.0
                }
            }
        }
    }
}

/// The "in" curve of each family; out and in-out are derived by reflection.
fn ease_in(family: EaseFamily, t: f64) -> f64 {
    match family {
        EaseFamily::Back => {
            const C1: f64 = 1.70158;
            (C1 + 1.0) * t * t * t - C1 * t * t
        }
        EaseFamily::Bounce => 1.0 - bounce_out(1.0 - t),
        EaseFamily::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
        EaseFamily::Cubic => t.powi(3),
        EaseFamily::Elastic => {
            if t <= 0.0 || t >= 1.0 {
                return t;
            }
            let c4 = (2.0 * PI) / 3.0;
            -(2f64.powf(10.0 * t - 10.0)) * ((10.0 * t - 10.75) * c4).sin()
        }
        EaseFamily::Expo => {
            if t <= 0.0 {
                0.0
            } else {
                2f64.powf(10.0 * t - 10.0)
            }
        }
        EaseFamily::Quad => t * t,
        EaseFamily::Quart => t.powi(4),
        EaseFamily::Quint => t.powi(5),
        EaseFamily::Sine => 1.0 - (t * PI / 2.0).cos(),
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
