//! Extraction through the engine's ingest attachment processor.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use asset_search_repository::utils::value_at_path;
use asset_search_repository::SearchEngineClient;
use asset_search_shared::{Asset, ExtractedAttachment, ExtractedContent};

use crate::extraction::AssetExtractor;
use crate::interfaces::AssetRepository;

/// Source field holding the base64 encoded binary.
const ASSET_FIELD: &str = "asset_content";

/// Path of the extracted fields in the simulation response.
const ATTACHMENT_PATH: &str = "docs.0.doc._source.attachment";

/// Maximum number of characters the processor extracts.
const INDEXED_CHARS: u64 = 100_000;

/// Runs the asset binary through a simulated `attachment` pipeline.
pub struct IngestAttachmentExtractor {
    client: Arc<dyn SearchEngineClient>,
    repository: Arc<dyn AssetRepository>,
    max_file_size: u64,
}

impl IngestAttachmentExtractor {
    /// Create a new extractor.
    ///
    /// # Arguments
    ///
    /// * `client` - Engine client running the pipeline simulation
    /// * `repository` - Source of the asset binaries
    /// * `max_file_size` - Assets larger than this many bytes are not extracted
    pub fn new(
        client: Arc<dyn SearchEngineClient>,
        repository: Arc<dyn AssetRepository>,
        max_file_size: u64,
    ) -> Self {
        Self {
            client,
            repository,
            max_file_size,
        }
    }

    fn simulate_request(encoded: String) -> Value {
        json!({
            "pipeline": {
                "description": "Attachment Extraction",
                "processors": [
                    {
                        "attachment": {
                            "field": ASSET_FIELD,
                            "indexed_chars": INDEXED_CHARS,
                            "ignore_missing": true
                        }
                    }
                ]
            },
            "docs": [
                { "_source": { (ASSET_FIELD): encoded } }
            ]
        })
    }
}

#[async_trait]
impl AssetExtractor for IngestAttachmentExtractor {
    #[instrument(skip(self, asset), fields(asset = %asset.identifier, filename = %asset.filename))]
    async fn extract(&self, asset: &Asset) -> ExtractedContent {
        if asset.file_size > self.max_file_size {
            info!(
                file_size = asset.file_size,
                max_file_size = self.max_file_size,
                "Asset exceeds the maximum file size, content was not extracted"
            );
            return ExtractedContent::empty();
        }

        let bytes = match self.repository.read_resource(asset).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "Could not read the resource of the asset");
                return ExtractedContent::empty();
            }
        };

        let request = Self::simulate_request(STANDARD.encode(bytes));
        let response = match self.client.simulate_pipeline(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    file_size = asset.file_size,
                    error = %e,
                    "The asset could not be ingested"
                );
                return ExtractedContent::empty();
            }
        };

        let attachment = value_at_path(&response, ATTACHMENT_PATH)
            .filter(|attachment| attachment.is_object())
            .map(ExtractedAttachment::from_value);

        match attachment {
            Some(attachment) => {
                debug!(
                    content_type = %attachment.content_type,
                    content_length = attachment.content_length,
                    "Extracted asset content"
                );
                ExtractedContent::from(attachment)
            }
            None => {
                error!("Error while extracting fulltext data, see the engine log for details");
                ExtractedContent::empty()
            }
        }
    }
}
