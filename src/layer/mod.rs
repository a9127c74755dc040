//! Layer files: the authored model, cascade resolution, and repetition flattening.
//!
//! A layer file is read once per reload and turned into an immutable [`ResolvedLayer`]; the
//! renderer never sees the partially specified model.

pub mod cascade;
pub mod model;
pub mod resolve;

use std::path::{Path, PathBuf};

use crate::animation::keyframer::Animation;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::layer::cascade::{MissingPrototype, cascade_object};
use crate::layer::model::{BlendMode, CameraKind, LayerDef};
use crate::layer::resolve::{ObjectSite, ResolvedObject, finish, flatten_repetitions};

/// Layer camera with its loaded animation.
#[derive(Clone, Debug)]
pub struct Camera {
    pub kind: CameraKind,
    pub animation: Animation,
}

/// One layer file after cascade resolution and repetition flattening.
#[derive(Clone, Debug)]
pub struct ResolvedLayer {
    /// Layer file this snapshot was built from.
    pub file: PathBuf,
    pub enabled: bool,
    pub z_index: i32,
    pub camera: Camera,
    pub blend: BlendMode,
    /// Objects in flattened source order.
    pub objects: Vec<ResolvedObject>,
}

impl ResolvedLayer {
    /// File stem of the layer file.
    pub fn name(&self) -> String {
        self.file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Distinct asset paths referenced by this layer's objects, in first-reference order.
    pub fn asset_paths(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.objects
            .iter()
            .flat_map(|o| o.assets.iter().map(String::as_str))
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

/// Read and resolve the layer file at `file`.
///
/// Malformed JSON and every resolution failure are reported as configuration errors naming the
/// file; asset patterns are expanded under `assets_root`.
#[tracing::instrument(skip(assets_root), fields(file = %file.display()))]
pub fn load_layer(file: &Path, assets_root: &Path) -> LayerplayResult<ResolvedLayer> {
    let bytes = std::fs::read(file)
        .map_err(|e| LayerplayError::config(file, "$", format!("read failed: {e}")))?;
    let def: LayerDef = serde_json::from_slice(&bytes)
        .map_err(|e| LayerplayError::config(file, "$", format!("malformed JSON: {e}")))?;
    let layer = resolve_layer(def, file, assets_root)?;
    tracing::debug!(objects = layer.objects.len(), "resolved layer");
    Ok(layer)
}

/// Resolve an already parsed layer definition.
pub fn resolve_layer(
    def: LayerDef,
    file: &Path,
    assets_root: &Path,
) -> LayerplayResult<ResolvedLayer> {
    let camera = Camera {
        kind: def.camera.kind,
        animation: Animation::load(&def.camera.keyframer, &def.properties)
            .map_err(|e| e.at(file, "camera.keyframer"))?,
    };

    let mut objects = Vec::new();
    for (source_index, object) in def.objects.iter().enumerate() {
        let site = ObjectSite {
            file,
            assets_root,
            source_index,
        };
        let cascaded = cascade_object(object, &def.prototypes, &def.properties).map_err(
            |MissingPrototype(name)| {
                LayerplayError::config(
                    file,
                    format!("objects[{source_index}].prototype"),
                    format!("unknown prototype '{name}'"),
                )
            },
        )?;
        for instance in flatten_repetitions(cascaded) {
            let index = objects.len();
            objects.push(finish(instance, &site, index)?);
        }
    }

    Ok(ResolvedLayer {
        file: file.to_path_buf(),
        enabled: def.enabled,
        z_index: def.z_index,
        camera,
        blend: def.blend.mode,
        objects,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layer/mod.rs"]
mod tests;
