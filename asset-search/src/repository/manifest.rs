//! Asset repository backed by a JSON manifest.
//!
//! The manifest lists the assets and their descriptive metadata; the binaries
//! stay on disk next to it:
//!
//! ```json
//! {
//!   "assets": [
//!     {
//!       "identifier": "5c3e0b0e",
//!       "path": "files/report.pdf",
//!       "title": "Annual report",
//!       "mediaType": "application/pdf",
//!       "tags": [{"identifier": "t1", "label": "Reports"}],
//!       "collections": [{"identifier": "c1", "title": "Press"}]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use asset_search_shared::{Asset, AssetCollection, Tag};

use crate::interfaces::AssetRepository;
use crate::AssetSearchError;

/// One asset as listed in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub identifier: String,
    /// Location of the binary, relative to the manifest.
    pub path: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub copyright_notice: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub collections: Vec<AssetCollection>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    assets: Vec<ManifestEntry>,
}

/// Read-only repository over the assets listed in a manifest file.
#[derive(Debug, Clone)]
pub struct ManifestAssetRepository {
    assets: Vec<Asset>,
    paths: HashMap<String, PathBuf>,
}

impl ManifestAssetRepository {
    /// Load the manifest and stat every listed file.
    ///
    /// File size and filename are taken from disk. The modification time of the
    /// file is used when the manifest does not name one.
    ///
    /// # Errors
    ///
    /// Fails if the manifest cannot be read or parsed, or a listed file is missing.
    #[instrument]
    pub async fn load(manifest_path: &Path) -> Result<Self, AssetSearchError> {
        let raw = tokio::fs::read(manifest_path).await?;
        let manifest: Manifest = serde_json::from_slice(&raw).map_err(|e| {
            AssetSearchError::repository(format!(
                "Invalid asset manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })?;
        let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

        let mut assets = Vec::with_capacity(manifest.assets.len());
        let mut paths = HashMap::with_capacity(manifest.assets.len());
        for entry in manifest.assets {
            let path = base_dir.join(&entry.path);
            let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
                AssetSearchError::repository(format!(
                    "Resource of asset {} at {} is not readable: {}",
                    entry.identifier,
                    path.display(),
                    e
                ))
            })?;

            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let last_modified = entry
                .last_modified
                .or_else(|| metadata.modified().ok().map(DateTime::<Utc>::from));

            let asset = Asset {
                identifier: entry.identifier.clone(),
                filename,
                file_size: metadata.len(),
                media_type: entry.media_type.unwrap_or_default(),
                title: entry.title,
                caption: entry.caption,
                copyright_notice: entry.copyright_notice,
                tags: entry.tags,
                collections: entry.collections,
                last_modified,
            };
            paths.insert(entry.identifier, path);
            assets.push(asset);
        }

        info!(asset_count = assets.len(), "Loaded asset manifest");
        Ok(Self { assets, paths })
    }
}

#[async_trait]
impl AssetRepository for ManifestAssetRepository {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Asset>, AssetSearchError> {
        Ok(self
            .assets
            .iter()
            .find(|asset| asset.identifier == identifier)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Asset>, AssetSearchError> {
        Ok(self.assets.clone())
    }

    async fn read_resource(&self, asset: &Asset) -> std::io::Result<Vec<u8>> {
        let path = self.paths.get(&asset.identifier).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No resource known for asset {}", asset.identifier),
            )
        })?;
        tokio::fs::read(path).await
    }
}
