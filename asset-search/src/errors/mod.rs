//! Error types for the index commands.

use thiserror::Error;

use asset_search_repository::SearchIndexError;

/// Errors that abort an index command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// A build phase failed.
    #[error("Phase \"{phase}\" failed: {source}")]
    PhaseFailed {
        phase: String,
        #[source]
        source: SearchIndexError,
    },

    /// A phase running as a child process exited unsuccessfully.
    #[error("Command {command} with arguments {arguments:?} failed: {reason}")]
    SubprocessFailed {
        command: String,
        arguments: Vec<String>,
        reason: String,
    },

    /// Reading the asset repository failed.
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl CommandError {
    /// Create a phase error.
    pub fn phase(phase: impl Into<String>, source: SearchIndexError) -> Self {
        Self::PhaseFailed {
            phase: phase.into(),
            source,
        }
    }

    /// Create a subprocess error.
    pub fn subprocess(
        command: impl Into<String>,
        arguments: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::SubprocessFailed {
            command: command.into(),
            arguments,
            reason: reason.into(),
        }
    }

    /// Create a repository error.
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::RepositoryError(msg.into())
    }
}
