//! Asset Search Main Entry Point
//!
//! Command line interface building and cleaning up the asset index.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use asset_search::command::{AssetIndexCommand, PhaseExecution};
use asset_search::{AssetSearchConfig, AssetSearchError, Dependencies};

#[derive(Parser)]
#[command(name = "asset-search", version, about = "Index assets into OpenSearch")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index all assets into a new index and switch the alias to it
    Build {
        /// Index at most this many assets
        #[arg(long)]
        limit: Option<usize>,

        /// Reuse the existing index instead of creating a new one (development only)
        #[arg(long)]
        update: bool,

        /// Postfix of the new index, defaults to the current unix timestamp
        #[arg(long)]
        postfix: Option<String>,
    },

    /// Remove indices the alias no longer points at
    Cleanup,

    #[command(hide = true)]
    CreateInternal {
        #[arg(long)]
        postfix: String,
        #[arg(long)]
        update: bool,
    },

    #[command(hide = true)]
    BuildInternal {
        #[arg(long)]
        postfix: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    #[command(hide = true)]
    RefreshInternal {
        #[arg(long)]
        postfix: String,
    },

    #[command(hide = true)]
    AliasInternal {
        #[arg(long)]
        postfix: String,
        #[arg(long)]
        update: bool,
    },
}

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("asset_search=info,asset_search_repository=info"));

    let json_output = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "asset-search",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

async fn run(command: Commands, mut index_command: AssetIndexCommand) -> Result<(), AssetSearchError> {
    match command {
        Commands::Build {
            limit,
            update,
            postfix,
        } => {
            index_command.build(limit, update, postfix).await?;
        }
        Commands::Cleanup => {
            index_command.cleanup().await?;
        }
        Commands::CreateInternal { postfix, update } => {
            index_command.create_internal(update, &postfix).await?;
        }
        Commands::BuildInternal { postfix, limit } => {
            index_command.build_internal(limit, &postfix).await?;
        }
        Commands::RefreshInternal { postfix } => {
            index_command.refresh_internal(&postfix).await?;
        }
        Commands::AliasInternal { postfix, update } => {
            index_command.alias_internal(update, &postfix).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AssetSearchError> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AssetSearchConfig::from_env();
    let execution = if config.use_sub_processes {
        PhaseExecution::current_executable()?
    } else {
        PhaseExecution::InProcess
    };

    let deps = match Dependencies::new(config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let index_command = deps.index_command(execution)?;
    match run(cli.command, index_command).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e)
        }
    }
}
