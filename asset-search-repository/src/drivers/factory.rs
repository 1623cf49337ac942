//! Resolution of the driver set for the configured engine version.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::drivers::{
    DocumentDriver, DocumentDriverV6, DocumentDriverV7, IndexDriver, IndexDriverV6, IndexerDriver,
    IndexerDriverV6, IndexerDriverV7, RequestDriver, RequestDriverV6, SystemDriver, SystemDriverV6,
};
use crate::errors::SearchIndexError;
use crate::interfaces::SearchEngineClient;
use crate::query::{FilteredQuery, FunctionScoreQuery, SearchRequest};

/// Supported engine wire-protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverVersion {
    V6,
    V7,
}

impl FromStr for DriverVersion {
    type Err = SearchIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "6" | "6.x" => Ok(DriverVersion::V6),
            "7" | "7.x" => Ok(DriverVersion::V7),
            other => Err(SearchIndexError::configuration(format!(
                "No driver available for engine version \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverVersion::V6 => write!(f, "6"),
            DriverVersion::V7 => write!(f, "7"),
        }
    }
}

/// Request representation handed out to query builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Filtered,
    FunctionScore,
}

impl FromStr for QueryType {
    type Err = SearchIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "filtered" => Ok(QueryType::Filtered),
            "function_score" => Ok(QueryType::FunctionScore),
            other => Err(SearchIndexError::configuration(format!(
                "Unknown query type \"{}\"",
                other
            ))),
        }
    }
}

/// The drivers of one engine version, shared by every component.
#[derive(Clone)]
pub struct DriverSet {
    pub version: DriverVersion,
    pub document: Arc<dyn DocumentDriver>,
    pub indexer: Arc<dyn IndexerDriver>,
    pub index: Arc<dyn IndexDriver>,
    pub request: Arc<dyn RequestDriver>,
    pub system: Arc<dyn SystemDriver>,
    pub query_type: QueryType,
}

impl DriverSet {
    /// A fresh request representation of the configured query type.
    pub fn new_query(&self) -> Box<dyn SearchRequest> {
        match self.query_type {
            QueryType::Filtered => Box::new(FilteredQuery::new()),
            QueryType::FunctionScore => Box::new(FunctionScoreQuery::default()),
        }
    }
}

pub struct DriverFactory;

impl DriverFactory {
    /// Resolve the driver set for a configured version and query type.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either value is unknown.
    pub fn create(
        version: &str,
        query_type: &str,
        client: Arc<dyn SearchEngineClient>,
    ) -> Result<DriverSet, SearchIndexError> {
        let version: DriverVersion = version.parse()?;
        let query_type: QueryType = query_type.parse()?;
        Ok(Self::for_version(version, query_type, client))
    }

    pub fn for_version(
        version: DriverVersion,
        query_type: QueryType,
        client: Arc<dyn SearchEngineClient>,
    ) -> DriverSet {
        let (document, indexer): (Arc<dyn DocumentDriver>, Arc<dyn IndexerDriver>) = match version {
            DriverVersion::V6 => (Arc::new(DocumentDriverV6), Arc::new(IndexerDriverV6)),
            DriverVersion::V7 => (Arc::new(DocumentDriverV7), Arc::new(IndexerDriverV7)),
        };

        DriverSet {
            version,
            document,
            indexer,
            index: Arc::new(IndexDriverV6::new(client.clone())),
            request: Arc::new(RequestDriverV6::new(client.clone())),
            system: Arc::new(SystemDriverV6::new(client)),
            query_type,
        }
    }
}
