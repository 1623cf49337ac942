//! Asset repositories.

mod manifest;

pub use manifest::{ManifestAssetRepository, ManifestEntry};
