use std::path::{Path, PathBuf};

/// Convenience result type used across layerplay.
pub type LayerplayResult<T> = Result<T, LayerplayError>;

/// Top-level error taxonomy used by player APIs.
#[derive(thiserror::Error, Debug)]
pub enum LayerplayError {
    /// Authored data that cannot be resolved: malformed JSON, missing prototype references,
    /// unresolved defaults, unknown easing names, bad keyframe expressions.
    #[error("configuration error in '{}' at {field}: {message}", file.display())]
    Config {
        /// Offending layer or config file.
        file: PathBuf,
        /// Dotted field path inside the file.
        field: String,
        /// Human readable reason.
        message: String,
    },

    /// Missing or undecodable asset referenced by a layer object.
    #[error(
        "asset error for '{}' (layer '{}', {object}): {message}",
        path.display(),
        layer.display()
    )]
    Asset {
        /// Asset path, relative to the assets root when known.
        path: PathBuf,
        /// Layer file that owns the referencing object.
        layer: PathBuf,
        /// Identifying fields of the referencing object.
        object: String,
        /// Human readable reason.
        message: String,
    },

    /// Invalid user-provided values not tied to a file.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while loading or sampling keyframe animations.
    #[error("animation error: {0}")]
    Animation(String),

    /// Render-time invariant violations.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayerplayError {
    /// Build a [`LayerplayError::Config`] value.
    pub fn config(
        file: impl AsRef<Path>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Config {
            file: file.as_ref().to_path_buf(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a [`LayerplayError::Asset`] value.
    pub fn asset(
        path: impl AsRef<Path>,
        layer: impl AsRef<Path>,
        object: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Asset {
            path: path.as_ref().to_path_buf(),
            layer: layer.as_ref().to_path_buf(),
            object: object.into(),
            message: message.into(),
        }
    }

    /// Build a [`LayerplayError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LayerplayError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`LayerplayError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`LayerplayError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors caused by authored layer or config data.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Re-tag any error as a configuration error located at `file`/`field`.
    ///
    /// Configuration and asset errors already carry their own location and pass through.
    pub(crate) fn at(self, file: &Path, field: impl Into<String>) -> Self {
        match self {
            Self::Config { .. } | Self::Asset { .. } => self,
            other => Self::config(file, field, other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
