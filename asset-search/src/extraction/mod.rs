//! Extraction of text and metadata from asset binaries.

use async_trait::async_trait;

use asset_search_shared::{Asset, ExtractedContent};

mod ingest_attachment;

pub use ingest_attachment::IngestAttachmentExtractor;

/// Extracts the content of an asset.
///
/// Extraction never fails: whatever goes wrong is logged and results in empty
/// content, so that the structured fields of the asset are still indexed.
#[async_trait]
pub trait AssetExtractor: Send + Sync {
    async fn extract(&self, asset: &Asset) -> ExtractedContent;
}
