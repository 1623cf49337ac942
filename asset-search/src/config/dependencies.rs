//! Dependency initialization and wiring for the asset search.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};

use asset_search_repository::{
    get_index_settings, DriverFactory, DriverSet, OpenSearchClient, SearchEngineClient,
    SearchIndexError,
};

use crate::command::{AssetIndexCommand, PhaseExecution};
use crate::config::{AssetSearchConfig, ConnectionMode};
use crate::error_handling::ErrorHandlingService;
use crate::extraction::{AssetExtractor, IngestAttachmentExtractor};
use crate::index_name::IndexNameStrategy;
use crate::indexer::{AssetIndexer, AssetIndexingManager};
use crate::interfaces::AssetRepository;
use crate::repository::ManifestAssetRepository;
use crate::search::QueryBuilder;
use crate::AssetSearchError;

/// Container for all initialized dependencies.
///
/// Components holding per-run state (indexer, query builder, indexing manager)
/// are created on demand from the shared collaborators.
pub struct Dependencies {
    pub config: AssetSearchConfig,
    pub client: Arc<dyn SearchEngineClient>,
    pub drivers: DriverSet,
    pub repository: Arc<dyn AssetRepository>,
    pub error_handler: Arc<ErrorHandlingService>,
    pub extractor: Arc<dyn AssetExtractor>,
    /// Settings and mapping applied when an index is created.
    pub index_settings: Value,
}

impl Dependencies {
    /// Connect to OpenSearch and load the asset manifest.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AssetSearchError)` - If a connection cannot be established in fail-fast mode,
    ///   the driver configuration is invalid, or the manifest or mapping file cannot be read
    pub async fn new(config: AssetSearchConfig) -> Result<Self, AssetSearchError> {
        info!(
            opensearch_url = %config.opensearch_url,
            connection_mode = ?config.connection_mode,
            retry_interval_secs = config.retry_interval.as_secs(),
            index_name = %config.index_name,
            driver_version = %config.driver_version,
            "Initializing dependencies"
        );

        let client = Self::connect_to_opensearch(
            &config.opensearch_url,
            config.connection_mode,
            config.retry_interval,
        )
        .await?;
        info!("OpenSearch connection established");

        let repository = ManifestAssetRepository::load(&config.asset_manifest).await?;

        Self::from_parts(config, Arc::new(client), Arc::new(repository)).await
    }

    /// Wire the remaining dependencies around an existing client and repository.
    pub async fn from_parts(
        config: AssetSearchConfig,
        client: Arc<dyn SearchEngineClient>,
        repository: Arc<dyn AssetRepository>,
    ) -> Result<Self, AssetSearchError> {
        let drivers = DriverFactory::create(&config.driver_version, &config.query_type, client.clone())?;
        let extractor: Arc<dyn AssetExtractor> = Arc::new(IngestAttachmentExtractor::new(
            client.clone(),
            repository.clone(),
            config.max_file_size,
        ));
        let index_settings = Self::load_index_settings(config.mapping_file.as_deref()).await?;

        Ok(Self {
            config,
            client,
            drivers,
            repository,
            error_handler: Arc::new(ErrorHandlingService::new()),
            extractor,
            index_settings,
        })
    }

    pub fn index_name_strategy(&self) -> IndexNameStrategy {
        IndexNameStrategy::new(self.config.index_name.clone())
    }

    /// A new indexer writing to the configured index.
    pub fn asset_indexer(&self) -> Result<AssetIndexer, SearchIndexError> {
        Ok(AssetIndexer::new(
            &self.index_name_strategy(),
            self.client.clone(),
            self.drivers.clone(),
            self.extractor.clone(),
            self.error_handler.clone(),
            self.config.bulk,
        )?
        .with_index_settings(self.index_settings.clone()))
    }

    /// A new indexing manager around a fresh indexer.
    pub fn indexing_manager(&self) -> Result<AssetIndexingManager, SearchIndexError> {
        Ok(AssetIndexingManager::new(
            Box::new(self.asset_indexer()?),
            self.config.indexing_batch_size,
        ))
    }

    /// The build and cleanup command, running its phases as configured.
    pub fn index_command(&self, execution: PhaseExecution) -> Result<AssetIndexCommand, SearchIndexError> {
        Ok(AssetIndexCommand::new(
            self.asset_indexer()?,
            self.repository.clone(),
            self.error_handler.clone(),
            execution,
        ))
    }

    /// A new query builder over the configured index.
    pub fn query_builder(&self) -> Result<QueryBuilder, SearchIndexError> {
        QueryBuilder::new(
            &self.index_name_strategy(),
            self.client.clone(),
            self.repository.clone(),
            self.drivers.new_query(),
        )
    }

    async fn load_index_settings(mapping_file: Option<&Path>) -> Result<Value, AssetSearchError> {
        let Some(path) = mapping_file else {
            return Ok(get_index_settings());
        };

        let contents = tokio::fs::read_to_string(path).await?;
        let settings: Value = serde_json::from_str(&contents).map_err(|e| {
            AssetSearchError::config(format!(
                "Invalid mapping file {}: {}",
                path.display(),
                e
            ))
        })?;
        info!(mapping_file = %path.display(), "Loaded index settings");
        Ok(settings)
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchClient, AssetSearchError> {
        loop {
            match Self::try_connect_opensearch(url).await {
                Ok(client) => return Ok(client),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(AssetSearchError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Create a client and check that the cluster answers.
    async fn try_connect_opensearch(url: &str) -> Result<OpenSearchClient, SearchIndexError> {
        let client = OpenSearchClient::new(url).await?;
        client.stats().await?;
        Ok(client)
    }
}
