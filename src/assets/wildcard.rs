use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{LayerplayError, LayerplayResult};

/// Normalize and validate an assets-relative path.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> LayerplayResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(LayerplayError::validation(format!(
            "asset path '{source}' must be relative"
        )));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(LayerplayError::validation(format!(
                "asset path '{source}' must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(LayerplayError::validation(
            "asset path must contain a file name",
        ));
    }
    Ok(out.join("/"))
}

pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains('*')
}

/// Expand one asset pattern against `assets_root`.
///
/// `dir/*.ext` yields every file in `dir` whose extension matches `ext` case-insensitively,
/// sorted by path relative to the root. Plain paths are normalized and returned as-is.
pub fn expand_pattern(pattern: &str, assets_root: &Path) -> LayerplayResult<Vec<String>> {
    let norm = normalize_rel_path(pattern)?;
    if !is_wildcard(&norm) {
        return Ok(vec![norm]);
    }

    let root = assets_root.to_str().ok_or_else(|| {
        LayerplayError::validation(format!(
            "assets root '{}' is not valid UTF-8",
            assets_root.display()
        ))
    })?;
    let full = format!("{}/{norm}", glob::Pattern::escape(root.trim_end_matches('/')));
    let opts = glob::MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut out = Vec::new();
    for entry in glob::glob_with(&full, opts)
        .with_context(|| format!("invalid asset pattern '{pattern}'"))?
    {
        let path = entry.with_context(|| format!("failed to expand asset pattern '{pattern}'"))?;
        if !path.is_file() {
            continue;
        }
        let rel = path.strip_prefix(assets_root).with_context(|| {
            format!(
                "expanded path '{}' escapes the assets root",
                path.display()
            )
        })?;
        let rel = rel.to_string_lossy().replace('\\', "/");
        out.push(rel);
    }
    out.sort();
    Ok(out)
}

/// Expand every pattern of an object's asset list, keeping pattern order.
pub fn expand_patterns(patterns: &[String], assets_root: &Path) -> LayerplayResult<Vec<String>> {
    let mut out = Vec::new();
    for p in patterns {
        out.extend(expand_pattern(p, assets_root)?);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/wildcard.rs"]
mod tests;
