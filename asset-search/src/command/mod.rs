//! The `build` and `cleanup` commands.
//!
//! A build runs in phases. Every phase can run in its own child process,
//! which keeps the memory of a long build bounded by a single phase.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use asset_search_repository::SearchIndexError;

use crate::error_handling::ErrorHandlingService;
use crate::errors::CommandError;
use crate::indexer::{AssetIndexer, AssetIndexing};
use crate::interfaces::AssetRepository;

mod phase;

pub use phase::{Phase, PhaseExecution};

/// Builds a fresh index and swaps the alias to it.
pub struct AssetIndexCommand {
    indexer: AssetIndexer,
    repository: Arc<dyn AssetRepository>,
    error_handler: Arc<ErrorHandlingService>,
    execution: PhaseExecution,
}

impl AssetIndexCommand {
    pub fn new(
        indexer: AssetIndexer,
        repository: Arc<dyn AssetRepository>,
        error_handler: Arc<ErrorHandlingService>,
        execution: PhaseExecution,
    ) -> Self {
        Self {
            indexer,
            repository,
            error_handler,
            execution,
        }
    }

    pub fn indexer(&self) -> &AssetIndexer {
        &self.indexer
    }

    /// Index all assets into a new index and point the alias at it.
    ///
    /// # Arguments
    ///
    /// * `limit` - Index at most this many assets
    /// * `update` - Development mode, reuse the existing index of the postfix
    /// * `postfix` - Postfix of the new index, the current unix timestamp if unset
    ///
    /// # Returns
    ///
    /// The postfix of the built index.
    pub async fn build(
        &mut self,
        limit: Option<usize>,
        update: bool,
        postfix: Option<String>,
    ) -> Result<String, CommandError> {
        let postfix = postfix.unwrap_or_else(|| chrono::Utc::now().timestamp().to_string());
        self.indexer.set_index_name_postfix(postfix.clone());
        info!(
            index = %self.indexer.index_name(),
            update,
            limit = ?limit,
            "Starting index build"
        );

        self.run_and_log(
            "Create index",
            Phase::Create {
                update,
                postfix: postfix.clone(),
            },
        )
        .await?;

        let aliases_exist = self
            .indexer
            .aliases_exist()
            .await
            .map_err(|e| CommandError::phase("Check aliases", e))?;
        if !aliases_exist {
            self.run_and_log(
                "Set up aliases",
                Phase::Alias {
                    update,
                    postfix: postfix.clone(),
                },
            )
            .await?;
        }

        self.run_and_log(
            "Index assets",
            Phase::Build {
                limit,
                postfix: postfix.clone(),
            },
        )
        .await?;
        self.run_and_log(
            "Refresh index",
            Phase::Refresh {
                postfix: postfix.clone(),
            },
        )
        .await?;
        self.run_and_log(
            "Update aliases",
            Phase::Alias {
                update,
                postfix: postfix.clone(),
            },
        )
        .await?;

        self.indexer
            .update_main_alias()
            .await
            .map_err(|e| CommandError::phase("Update main alias", e))?;

        self.output_error_handling();
        info!(postfix = %postfix, "Index build finished");
        Ok(postfix)
    }

    /// Create the index of the postfix.
    ///
    /// Entry point of the `create-internal` subcommand. Returns the number of
    /// errors reported while running the phase.
    pub async fn create_internal(&mut self, update: bool, postfix: &str) -> Result<usize, CommandError> {
        self.create_index(update, postfix).await?;
        Ok(self.output_error_handling())
    }

    /// Queue every asset, up to `limit`, and flush the remainder.
    ///
    /// Entry point of the `build-internal` subcommand. Returns the number of
    /// errors reported while indexing, which a parent build process cannot see.
    pub async fn build_internal(
        &mut self,
        limit: Option<usize>,
        postfix: &str,
    ) -> Result<usize, CommandError> {
        self.index_assets(limit, postfix).await?;
        Ok(self.output_error_handling())
    }

    pub async fn refresh_internal(&mut self, postfix: &str) -> Result<usize, CommandError> {
        self.refresh_index(postfix).await?;
        Ok(self.output_error_handling())
    }

    /// Move the alias to the index of the postfix. Skipped in update mode.
    pub async fn alias_internal(&mut self, update: bool, postfix: &str) -> Result<usize, CommandError> {
        self.move_alias(update, postfix).await?;
        Ok(self.output_error_handling())
    }

    /// Delete every index the alias no longer points at.
    ///
    /// An engine that reports the alias or an index as missing is treated as
    /// having nothing to remove.
    pub async fn cleanup(&self) -> Result<Vec<String>, CommandError> {
        match self.indexer.remove_old_indices().await {
            Ok(removed) => {
                if removed.is_empty() {
                    info!("Nothing to remove.");
                }
                for index_name in &removed {
                    info!(index = %index_name, "Removing old index {}", index_name);
                }
                Ok(removed)
            }
            Err(SearchIndexError::ApiError { status, message }) => {
                error!(status, reason = %message, "Nothing removed, the engine rejected the request");
                Ok(Vec::new())
            }
            Err(e) => Err(CommandError::phase("cleanup", e)),
        }
    }

    async fn run_and_log(&mut self, description: &str, phase: Phase) -> Result<(), CommandError> {
        info!(phase = phase.command(), "{}", description);
        let started = Instant::now();
        self.run_phase(phase).await?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{} done",
            description
        );
        Ok(())
    }

    /// Errors of an in-process phase are reported once at the end of the build,
    /// a child process reports its own before exiting.
    async fn run_phase(&mut self, phase: Phase) -> Result<(), CommandError> {
        if let PhaseExecution::SubProcess { executable } = &self.execution {
            return phase::run_subprocess(executable, &phase).await;
        }

        match phase {
            Phase::Create { update, postfix } => self.create_index(update, &postfix).await,
            Phase::Build { limit, postfix } => self.index_assets(limit, &postfix).await,
            Phase::Refresh { postfix } => self.refresh_index(&postfix).await,
            Phase::Alias { update, postfix } => self.move_alias(update, &postfix).await,
        }
    }

    async fn create_index(&mut self, update: bool, postfix: &str) -> Result<(), CommandError> {
        self.indexer.set_index_name_postfix(postfix);
        self.indexer
            .create_index(update)
            .await
            .map_err(|e| CommandError::phase("create-internal", e))
    }

    async fn index_assets(&mut self, limit: Option<usize>, postfix: &str) -> Result<(), CommandError> {
        self.indexer.set_index_name_postfix(postfix);

        let assets = self
            .repository
            .find_all()
            .await
            .map_err(|e| CommandError::repository(e.to_string()))?;
        let total = limit.map_or(assets.len(), |limit| limit.min(assets.len()));
        info!(total, index = %self.indexer.index_name(), "Indexing assets");

        for (position, asset) in assets.iter().take(total).enumerate() {
            self.indexer
                .index_asset(asset)
                .await
                .map_err(|e| CommandError::phase("build-internal", e))?;
            if (position + 1) % 100 == 0 {
                info!(indexed = position + 1, total, "Indexing progress");
            }
        }

        self.indexer
            .flush()
            .await
            .map_err(|e| CommandError::phase("build-internal", e))
    }

    async fn refresh_index(&mut self, postfix: &str) -> Result<(), CommandError> {
        self.indexer.set_index_name_postfix(postfix);
        self.indexer
            .refresh()
            .await
            .map_err(|e| CommandError::phase("refresh-internal", e))
    }

    async fn move_alias(&mut self, update: bool, postfix: &str) -> Result<(), CommandError> {
        if update {
            return Ok(());
        }
        self.indexer.set_index_name_postfix(postfix);
        self.indexer
            .update_index_alias()
            .await
            .map_err(|e| CommandError::phase("alias-internal", e))
    }

    fn output_error_handling(&self) -> usize {
        let errors = self.error_handler.error_count();
        if self.error_handler.has_error() {
            warn!(errors, "{} errors were returned while indexing", errors);
        }
        errors
    }
}
