//! Configuration loaded from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use asset_search_repository::BulkBatchConfig;

mod dependencies;

pub use dependencies::Dependencies;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default base name of the asset index.
const DEFAULT_INDEX_NAME: &str = "assets";

/// Default engine wire-protocol version.
const DEFAULT_DRIVER_VERSION: &str = "7";

/// Default request representation.
const DEFAULT_QUERY_TYPE: &str = "function_score";

/// Default number of pending index and remove operations before the indexing manager flushes.
const DEFAULT_INDEXING_BATCH_SIZE: usize = 500;

/// Default maximum size of an asset whose content is extracted, 100 MiB.
const DEFAULT_MAX_FILE_SIZE: u64 = 104_857_600;

/// Default manifest listing the assets of the repository.
const DEFAULT_ASSET_MANIFEST: &str = "assets.json";

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse the connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if invalid.
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// All settings of the asset search.
#[derive(Debug, Clone)]
pub struct AssetSearchConfig {
    pub opensearch_url: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub index_name: String,
    pub driver_version: String,
    pub query_type: String,
    pub bulk: BulkBatchConfig,
    pub indexing_batch_size: usize,
    pub max_file_size: u64,
    /// JSON file replacing the default index settings and mapping.
    pub mapping_file: Option<PathBuf>,
    pub realtime_indexing_enabled: bool,
    pub use_sub_processes: bool,
    pub asset_manifest: PathBuf,
}

impl Default for AssetSearchConfig {
    fn default() -> Self {
        let bulk = BulkBatchConfig::default();
        Self {
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            connection_mode: ConnectionMode::Retry,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            driver_version: DEFAULT_DRIVER_VERSION.to_string(),
            query_type: DEFAULT_QUERY_TYPE.to_string(),
            bulk,
            indexing_batch_size: DEFAULT_INDEXING_BATCH_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            mapping_file: None,
            realtime_indexing_enabled: true,
            use_sub_processes: true,
            asset_manifest: PathBuf::from(DEFAULT_ASSET_MANIFEST),
        }
    }
}

impl AssetSearchConfig {
    /// Load the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `ASSET_INDEX_NAME`: Base name of the index and its alias (default: assets)
    /// - `ASSET_SEARCH_DRIVER_VERSION`: Engine protocol version, 6 or 7 (default: 7)
    /// - `ASSET_SEARCH_QUERY_TYPE`: "filtered" or "function_score" (default: function_score)
    /// - `BULK_MAX_ELEMENTS` / `BULK_MAX_OCTETS`: Bulk flush thresholds (default: 500 / 40000000)
    /// - `INDEXING_BATCH_SIZE`: Indexing manager threshold (default: 500)
    /// - `ASSET_MAX_FILE_SIZE`: Largest asset whose content is extracted (default: 104857600)
    /// - `ASSET_MAPPING_FILE`: Optional JSON file with index settings and mapping
    /// - `REALTIME_INDEXING_ENABLED`: Register realtime hooks (default: true)
    /// - `USE_SUB_PROCESSES`: Run build phases as child processes (default: true)
    /// - `ASSET_MANIFEST`: Asset manifest read by the binary (default: assets.json)
    ///
    /// Values that fail to parse fall back to their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            opensearch_url: env::var("OPENSEARCH_URL").unwrap_or(defaults.opensearch_url),
            connection_mode: env::var("OPENSEARCH_CONNECTION_MODE")
                .map(|value| ConnectionMode::parse(&value))
                .unwrap_or(defaults.connection_mode),
            retry_interval: parse_var::<u64>("OPENSEARCH_RETRY_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_interval),
            index_name: env::var("ASSET_INDEX_NAME").unwrap_or(defaults.index_name),
            driver_version: env::var("ASSET_SEARCH_DRIVER_VERSION")
                .unwrap_or(defaults.driver_version),
            query_type: env::var("ASSET_SEARCH_QUERY_TYPE").unwrap_or(defaults.query_type),
            bulk: BulkBatchConfig::new(
                parse_var("BULK_MAX_ELEMENTS").unwrap_or(defaults.bulk.max_elements),
                parse_var("BULK_MAX_OCTETS").unwrap_or(defaults.bulk.max_octets),
            ),
            indexing_batch_size: parse_var("INDEXING_BATCH_SIZE")
                .unwrap_or(defaults.indexing_batch_size),
            max_file_size: parse_var("ASSET_MAX_FILE_SIZE").unwrap_or(defaults.max_file_size),
            mapping_file: env::var("ASSET_MAPPING_FILE")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            realtime_indexing_enabled: parse_flag("REALTIME_INDEXING_ENABLED")
                .unwrap_or(defaults.realtime_indexing_enabled),
            use_sub_processes: parse_flag("USE_SUB_PROCESSES")
                .unwrap_or(defaults.use_sub_processes),
            asset_manifest: env::var("ASSET_MANIFEST")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_manifest),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(variable = name, value = %value, "Invalid value, using default");
            None
        }
    }
}

fn parse_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(variable = name, value = %value, "Invalid flag, using default");
            None
        }
    }
}
