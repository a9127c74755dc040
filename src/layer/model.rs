use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::animation::stagger::StaggerDef;
use crate::animation::stepping::SteppingMode;

/// Drawable kind of an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    /// Flat vector shapes from an SVG file.
    Svg,
    /// Raster image quad.
    Image,
    /// Vector shapes placed in 3D space.
    #[serde(rename = "svg-3d")]
    Svg3d,
    /// 3D model, treated as an opaque drawable.
    Gltf,
    /// Character grid revealed by encounter order.
    TextCurtain,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Image => "image",
            Self::Svg3d => "svg-3d",
            Self::Gltf => "gltf",
            Self::TextCurtain => "text-curtain",
        }
    }
}

/// Render target an object draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderTarget {
    Image,
    ClipA,
    ClipB,
}

impl RenderTarget {
    /// Fixed per-layer processing order: clip-a, clip-b, image.
    pub const ORDER: [RenderTarget; 3] = [Self::ClipA, Self::ClipB, Self::Image];
}

/// Which resolved clip mask an object samples, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipMask {
    #[default]
    None,
    A,
    B,
    InvertA,
    InvertB,
}

/// Where a draw attribute takes its value from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeSource {
    /// The object's animation channel.
    #[default]
    User,
    /// The asset's own authored style.
    Asset,
    /// Animation channel multiplied by the asset style.
    Modulate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraKind {
    #[default]
    Ortho,
    Perspective,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClippingDef {
    pub mask: Option<ClipMask>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RepetitionsDef {
    pub count: Option<u32>,
    pub interval: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SteppingDef {
    pub mode: Option<SteppingMode>,
    pub steps: Option<u32>,
    pub inertia: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AttributesDef {
    pub stroke_weight: Option<AttributeSource>,
    pub stroke: Option<AttributeSource>,
    pub fill: Option<AttributeSource>,
}

/// Partially specified object as authored in a layer file or prototype.
///
/// Every field is optional; `None` means "inherit" during cascading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ObjectDef {
    /// Space separated prototype names, applied left to right.
    pub prototype: Option<String>,
    pub time: Option<f64>,
    pub z_index: Option<i32>,
    #[serde(rename = "type")]
    pub kind: Option<ObjectKind>,
    pub target: Option<RenderTarget>,
    pub clipping: Option<ClippingDef>,
    pub assets: Option<Vec<String>>,
    /// Raw key objects; concatenated rather than replaced when cascading.
    pub keyframer: Option<Vec<serde_json::Value>>,
    pub repetitions: Option<RepetitionsDef>,
    /// Set by repetition flattening, never authored.
    #[serde(skip)]
    pub repetition_counter: Option<u32>,
    pub staggers: Option<Vec<StaggerDef>>,
    pub stepping: Option<SteppingDef>,
    pub attributes: Option<AttributesDef>,
    /// Numeric properties; merged per key when cascading.
    pub properties: Option<BTreeMap<String, f64>>,
}

impl ObjectDef {
    /// Built-in defaults at the bottom of every cascade, with the layer's properties merged in.
    pub fn defaults(layer_properties: &BTreeMap<String, f64>) -> Self {
        Self {
            prototype: Some(String::new()),
            time: Some(0.0),
            z_index: Some(0),
            kind: Some(ObjectKind::Svg),
            target: Some(RenderTarget::Image),
            clipping: Some(ClippingDef {
                mask: Some(ClipMask::None),
            }),
            assets: Some(vec!["asset-not-specified".to_string()]),
            keyframer: Some(Vec::new()),
            repetitions: Some(RepetitionsDef {
                count: Some(1),
                interval: Some(0.0),
            }),
            repetition_counter: Some(0),
            staggers: Some(vec![StaggerDef::default()]),
            stepping: Some(SteppingDef {
                mode: Some(SteppingMode::None),
                steps: Some(10),
                inertia: Some(0.0),
            }),
            attributes: Some(AttributesDef {
                stroke_weight: Some(AttributeSource::User),
                stroke: Some(AttributeSource::User),
                fill: Some(AttributeSource::User),
            }),
            properties: Some(layer_properties.clone()),
        }
    }

    /// Prototype names referenced by this definition, in application order.
    pub fn prototype_names(&self) -> impl Iterator<Item = &str> {
        self.prototype
            .as_deref()
            .unwrap_or("")
            .split(' ')
            .filter(|s| !s.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CameraDef {
    #[serde(rename = "type")]
    pub kind: CameraKind,
    pub keyframer: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BlendDef {
    pub mode: BlendMode,
}

fn enabled_default() -> bool {
    true
}

/// One layer file as authored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayerDef {
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub camera: CameraDef,
    #[serde(default)]
    pub blend: BlendDef,
    #[serde(default)]
    pub prototypes: BTreeMap<String, ObjectDef>,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    #[serde(default)]
    pub properties: BTreeMap<String, f64>,
}

impl Default for LayerDef {
    fn default() -> Self {
        Self {
            enabled: true,
            z_index: 0,
            camera: CameraDef::default(),
            blend: BlendDef::default(),
            prototypes: BTreeMap::new(),
            objects: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}
