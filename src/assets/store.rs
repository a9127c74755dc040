use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Context;
use rayon::prelude::*;

use crate::assets::curtain::TextCurtain;
use crate::assets::decode::{DecodedImage, decode_image};
use crate::assets::svg::{VectorComposition, parse_svg};
use crate::assets::wildcard::normalize_rel_path;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::layer::ResolvedLayer;
use crate::layer::model::ObjectKind;

/// How an asset file is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Vector,
    Image,
    Curtain,
    Font,
    /// 3D scene kept as opaque bytes.
    Model,
}

impl AssetKind {
    pub fn for_object(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Svg | ObjectKind::Svg3d => Self::Vector,
            ObjectKind::Image => Self::Image,
            ObjectKind::TextCurtain => Self::Curtain,
            ObjectKind::Gltf => Self::Model,
        }
    }
}

/// Decoded asset payload.
#[derive(Clone, Debug)]
pub enum Asset {
    Vector(Arc<VectorComposition>),
    Image(Arc<DecodedImage>),
    Curtain(Arc<TextCurtain>),
    Font(Arc<Vec<u8>>),
    Model(Arc<Vec<u8>>),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Vector(_) => AssetKind::Vector,
            Self::Image(_) => AssetKind::Image,
            Self::Curtain(_) => AssetKind::Curtain,
            Self::Font(_) => AssetKind::Font,
            Self::Model(_) => AssetKind::Model,
        }
    }
}

/// Normalized identity of a cached asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub kind: AssetKind,
    pub norm_path: String,
}

/// Decoded assets keyed by normalized path, each populated at most once.
///
/// Decoding happens outside the lock; when two callers race on the same key the first insert is
/// kept and both observe it.
#[derive(Debug)]
pub struct AssetCache {
    root: PathBuf,
    entries: RwLock<HashMap<AssetKey, Asset>>,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Root directory relative asset paths resolve under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, kind: AssetKind, rel: &str) -> bool {
        let Ok(norm_path) = normalize_rel_path(rel) else {
            return false;
        };
        self.entries
            .read()
            .map(|m| m.contains_key(&AssetKey { kind, norm_path }))
            .unwrap_or(false)
    }

    /// Cached asset for `rel`, decoding it on first request.
    pub fn get_or_load(&self, kind: AssetKind, rel: &str) -> LayerplayResult<Asset> {
        let key = AssetKey {
            kind,
            norm_path: normalize_rel_path(rel)?,
        };
        if let Some(hit) = self.read_entries()?.get(&key) {
            return Ok(hit.clone());
        }

        let decoded = self.decode(&key)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LayerplayError::evaluation("asset cache lock poisoned"))?;
        Ok(entries.entry(key).or_insert(decoded).clone())
    }

    pub fn vector(&self, rel: &str) -> LayerplayResult<Arc<VectorComposition>> {
        match self.get_or_load(AssetKind::Vector, rel)? {
            Asset::Vector(v) => Ok(v),
            other => Err(kind_mismatch(rel, &other)),
        }
    }

    pub fn image(&self, rel: &str) -> LayerplayResult<Arc<DecodedImage>> {
        match self.get_or_load(AssetKind::Image, rel)? {
            Asset::Image(v) => Ok(v),
            other => Err(kind_mismatch(rel, &other)),
        }
    }

    pub fn curtain(&self, rel: &str) -> LayerplayResult<Arc<TextCurtain>> {
        match self.get_or_load(AssetKind::Curtain, rel)? {
            Asset::Curtain(v) => Ok(v),
            other => Err(kind_mismatch(rel, &other)),
        }
    }

    pub fn font(&self, rel: &str) -> LayerplayResult<Arc<Vec<u8>>> {
        match self.get_or_load(AssetKind::Font, rel)? {
            Asset::Font(v) => Ok(v),
            other => Err(kind_mismatch(rel, &other)),
        }
    }

    /// Decode every asset `layer` references, in parallel.
    ///
    /// Failures are reported as asset errors naming the layer file and the first object that
    /// references the asset.
    #[tracing::instrument(skip_all, fields(layer = %layer.file.display()))]
    pub fn preload_layer(&self, layer: &ResolvedLayer) -> LayerplayResult<()> {
        let mut wanted: Vec<(AssetKind, &str, String)> = Vec::new();
        for obj in &layer.objects {
            let kind = AssetKind::for_object(obj.kind);
            for path in &obj.assets {
                if !wanted.iter().any(|(k, p, _)| *k == kind && p == path) {
                    wanted.push((kind, path.as_str(), obj.describe()));
                }
            }
        }

        wanted
            .par_iter()
            .map(|(kind, path, object)| {
                self.get_or_load(*kind, path)
                    .map(|_| ())
                    .map_err(|e| asset_error(path, &layer.file, object, e))
            })
            .collect::<LayerplayResult<Vec<()>>>()?;
        tracing::debug!(assets = wanted.len(), "preloaded layer assets");
        Ok(())
    }

    /// Drop every cached asset `layer` references so a reload decodes them afresh.
    pub fn evict_layer(&self, layer: &ResolvedLayer) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        for obj in &layer.objects {
            let kind = AssetKind::for_object(obj.kind);
            for path in &obj.assets {
                if let Ok(norm_path) = normalize_rel_path(path) {
                    entries.remove(&AssetKey { kind, norm_path });
                }
            }
        }
    }

    fn read_entries(
        &self,
    ) -> LayerplayResult<std::sync::RwLockReadGuard<'_, HashMap<AssetKey, Asset>>> {
        self.entries
            .read()
            .map_err(|_| LayerplayError::evaluation("asset cache lock poisoned"))
    }

    fn decode(&self, key: &AssetKey) -> LayerplayResult<Asset> {
        let path = self.root.join(Path::new(&key.norm_path));
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))?;
        Ok(match key.kind {
            AssetKind::Vector => Asset::Vector(Arc::new(parse_svg(&bytes)?)),
            AssetKind::Image => Asset::Image(Arc::new(decode_image(&bytes)?)),
            AssetKind::Curtain => {
                let text = String::from_utf8(bytes).context("text curtain is not UTF-8")?;
                Asset::Curtain(Arc::new(TextCurtain::parse(&text)?))
            }
            AssetKind::Font => Asset::Font(Arc::new(bytes)),
            AssetKind::Model => Asset::Model(Arc::new(bytes)),
        })
    }
}

/// Wrap a decode failure as an asset error for `object` in `layer`.
pub fn asset_error(path: &str, layer: &Path, object: &str, err: LayerplayError) -> LayerplayError {
    match err {
        LayerplayError::Asset { .. } => err,
        other => LayerplayError::asset(path, layer, object, format!("{other:#}")),
    }
}

fn kind_mismatch(rel: &str, got: &Asset) -> LayerplayError {
    LayerplayError::evaluation(format!("asset '{rel}' is cached as {:?}", got.kind()))
}

/// Shapes text with Parley from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    /// Registered family name per font asset path.
    families: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn family_for(&mut self, font_key: &str, font_bytes: &[u8]) -> LayerplayResult<String> {
        if let Some(name) = self.families.get(font_key) {
            return Ok(name.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            LayerplayError::validation("no font families registered from font bytes")
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| LayerplayError::validation("registered font family has no name"))?
            .to_string();
        self.families.insert(font_key.to_string(), name.clone());
        Ok(name)
    }

    /// Lay out one unwrapped line of text in the font stored at `font_key`.
    pub fn layout_line(
        &mut self,
        text: &str,
        font_key: &str,
        font_bytes: &[u8],
        size_px: f32,
    ) -> LayerplayResult<parley::Layout<()>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(LayerplayError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self.family_for(font_key, font_bytes)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
