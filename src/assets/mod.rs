//! Asset path expansion, decoding, and the shared decoded-asset cache.

pub mod curtain;
pub mod decode;
pub mod store;
pub mod svg;
pub mod wildcard;

pub use store::{Asset, AssetCache, AssetKind};
