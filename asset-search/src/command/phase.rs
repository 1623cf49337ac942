//! Build phases and their execution in a child process.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::errors::CommandError;

/// One step of an index build that can run in its own process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Create { update: bool, postfix: String },
    Build { limit: Option<usize>, postfix: String },
    Refresh { postfix: String },
    Alias { update: bool, postfix: String },
}

impl Phase {
    /// Name of the internal subcommand running this phase.
    pub fn command(&self) -> &'static str {
        match self {
            Phase::Create { .. } => "create-internal",
            Phase::Build { .. } => "build-internal",
            Phase::Refresh { .. } => "refresh-internal",
            Phase::Alias { .. } => "alias-internal",
        }
    }

    /// Command line arguments of the internal subcommand, flags left out when unset.
    pub fn arguments(&self) -> Vec<String> {
        let mut arguments = vec![self.command().to_string()];
        match self {
            Phase::Create { update, postfix } | Phase::Alias { update, postfix } => {
                arguments.extend(["--postfix".to_string(), postfix.clone()]);
                if *update {
                    arguments.push("--update".to_string());
                }
            }
            Phase::Build { limit, postfix } => {
                arguments.extend(["--postfix".to_string(), postfix.clone()]);
                if let Some(limit) = limit {
                    arguments.extend(["--limit".to_string(), limit.to_string()]);
                }
            }
            Phase::Refresh { postfix } => {
                arguments.extend(["--postfix".to_string(), postfix.clone()]);
            }
        }
        arguments
    }
}

/// Where the phases of a build are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseExecution {
    /// Call the phase on the command itself.
    InProcess,
    /// Run every phase as the given executable with the internal subcommand.
    SubProcess { executable: PathBuf },
}

impl PhaseExecution {
    /// Run phases in child processes of the current executable.
    pub fn current_executable() -> Result<Self, CommandError> {
        let executable = std::env::current_exe()
            .map_err(|e| CommandError::subprocess("current executable", Vec::new(), e.to_string()))?;
        Ok(Self::SubProcess { executable })
    }
}

/// Run a phase as a child process and wait for it.
///
/// # Errors
///
/// Fails if the process cannot be started or exits unsuccessfully.
pub(crate) async fn run_subprocess(executable: &Path, phase: &Phase) -> Result<(), CommandError> {
    let arguments = phase.arguments();
    let command = executable.display().to_string();
    debug!(command = %command, arguments = ?arguments, "Starting phase process");

    let status = Command::new(executable)
        .args(&arguments)
        .status()
        .await
        .map_err(|e| CommandError::subprocess(&command, arguments.clone(), e.to_string()))?;

    if !status.success() {
        return Err(CommandError::subprocess(
            command,
            arguments,
            format!("exited with {}", status),
        ));
    }
    Ok(())
}
