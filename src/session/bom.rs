use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::assets::wildcard::normalize_rel_path;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::session::demo::DemoConfig;
use crate::session::snapshot::DemoSnapshot;

/// Files a demo actually uses, for packaging.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    /// Layer files, relative to the demo root when they live under it.
    pub layers: Vec<String>,
    /// Referenced assets plus the soundtrack and font, relative to the assets root.
    pub assets: Vec<String>,
}

impl BillOfMaterials {
    pub fn to_json(&self) -> LayerplayResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LayerplayError::serde(e.to_string()))
    }
}

/// Sorted, deduplicated materials of `snapshot`.
pub fn bill_of_materials(
    snapshot: &DemoSnapshot,
    demo: &DemoConfig,
    demo_root: &Path,
) -> BillOfMaterials {
    let layers: BTreeSet<String> = snapshot
        .layers()
        .iter()
        .map(|l| {
            let rel = l.file.strip_prefix(demo_root).unwrap_or(&l.file);
            rel.to_string_lossy().replace('\\', "/")
        })
        .collect();

    let mut assets: BTreeSet<String> = snapshot
        .layers()
        .iter()
        .flat_map(|l| l.asset_paths())
        .map(str::to_string)
        .collect();
    let extras = demo
        .soundtrack
        .as_ref()
        .map(|s| s.file.as_str())
        .into_iter()
        .chain(demo.font.as_deref());
    for extra in extras {
        assets.insert(normalize_rel_path(extra).unwrap_or_else(|_| extra.to_string()));
    }

    BillOfMaterials {
        layers: layers.into_iter().collect(),
        assets: assets.into_iter().collect(),
    }
}

/// Files under `assets_root` that `bom` does not list, relative to the root. Hidden files are
/// skipped.
pub fn unused_materials(bom: &BillOfMaterials, assets_root: &Path) -> LayerplayResult<Vec<String>> {
    let used: BTreeSet<&str> = bom.assets.iter().map(String::as_str).collect();
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&assets_root.to_string_lossy())
    );
    let mut out = Vec::new();
    for entry in glob::glob(&pattern).context("invalid assets root pattern")? {
        let path = entry.context("walk assets root")?;
        if !path.is_file() {
            continue;
        }
        let Ok(rel) = path.strip_prefix(assets_root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        let hidden = rel.split('/').any(|seg| seg.starts_with('.'));
        if !hidden && !used.contains(rel.as_str()) {
            out.push(rel);
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/session/bom.rs"]
mod tests;
