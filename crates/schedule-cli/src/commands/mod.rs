//! CLI command definitions and dispatch.

pub mod audit;
pub mod bulk;
pub mod config;
pub mod grid;
pub mod moves;
pub mod sessions;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use schedule_core::config::AppConfig;
use schedule_core::config::persistence::PersistenceProvider;
use schedule_core::error::AppError;
use schedule_core::types::{AdminId, SessionId};
use schedule_core::CommandContext;
use schedule_engine::{
    BroadcastEventBus, JsonFileSessionStore, MemoryDirectory, MemorySessionStore, NameIndex,
    ScheduleEngine, SharedSessionStore,
};
use schedule_entity::Session;

use crate::output::{self, OutputFormat};

/// Weekly schedule administration
#[derive(Debug, Parser)]
#[command(name = "schedule", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay, loaded from `config/<env>.toml` when present
    #[arg(long, env = "SCHEDULE_ENV")]
    pub env: Option<String>,

    /// Administrator id recorded on emitted events
    #[arg(long)]
    pub actor: Option<AdminId>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect sessions
    Sessions(sessions::SessionsArgs),
    /// Move one session to another slot
    Move(moves::MoveArgs),
    /// Apply one operation to several sessions
    Bulk(bulk::BulkArgs),
    /// Show the weekly grid
    Grid(grid::GridArgs),
    /// Report data-integrity problems
    Audit,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Load the base configuration plus the environment overlay, if any.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        let overlay = self.env.as_ref().map(|env| format!("config/{env}.toml"));
        AppConfig::load_layered(&self.config, overlay.as_deref())
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let ctx = match self.actor {
            Some(actor) => CommandContext::new(actor),
            None => CommandContext::system(),
        };

        match &self.command {
            Commands::Config(args) => config::execute(args, config, &self.config, self.format),
            Commands::Sessions(args) => {
                let workspace = Workspace::open(config).await?;
                sessions::execute(args, &workspace, self.format).await
            }
            Commands::Move(args) => {
                let workspace = Workspace::open(config).await?;
                moves::execute(args, &workspace, &ctx, self.format).await
            }
            Commands::Bulk(args) => {
                let workspace = Workspace::open(config).await?;
                bulk::execute(args, &workspace, &ctx, self.format).await
            }
            Commands::Grid(args) => {
                let workspace = Workspace::open(config).await?;
                grid::execute(args, &workspace, self.format).await
            }
            Commands::Audit => {
                let workspace = Workspace::open(config).await?;
                audit::execute(&workspace, self.format).await
            }
        }
    }
}

/// An engine loaded from the configured store, plus the directory it
/// resolves names against.
pub struct Workspace {
    pub engine: ScheduleEngine,
    pub directory: Arc<MemoryDirectory>,
}

impl Workspace {
    /// Open the configured store and hydrate the engine from it.
    pub async fn open(config: &AppConfig) -> Result<Self, AppError> {
        tracing::debug!(
            provider = %config.persistence.provider,
            path = %config.persistence.path,
            "Opening schedule"
        );
        let (store, directory): (SharedSessionStore, Arc<MemoryDirectory>) =
            match config.persistence.provider {
                PersistenceProvider::JsonFile => {
                    let store = JsonFileSessionStore::open(&config.persistence.path).await?;
                    let directory = Arc::new(store.directory().await);
                    (Arc::new(store), directory)
                }
                PersistenceProvider::Memory => {
                    output::print_warning("Memory provider: changes are discarded on exit");
                    (
                        Arc::new(MemorySessionStore::new()),
                        Arc::new(MemoryDirectory::new()),
                    )
                }
            };

        let engine = ScheduleEngine::load(
            store,
            directory.clone(),
            Arc::new(BroadcastEventBus::new(config.events.buffer_size)),
            config.grid.clone(),
        )
        .await?
        .with_pending_ttl(Duration::from_secs(config.moves.pending_ttl_seconds));

        Ok(Self { engine, directory })
    }

    /// Display names for the trainers and types referenced by `sessions`.
    pub async fn names(&self, sessions: &[Session]) -> NameIndex {
        NameIndex::resolve(&*self.directory, sessions).await
    }
}

/// Parse a full session id.
pub fn parse_session_id(raw: &str) -> Result<SessionId, AppError> {
    raw.parse()
        .map_err(|e| AppError::validation(format!("Invalid session id '{raw}': {e}")))
}

/// Parse several session ids.
pub fn parse_session_ids(raw: &[String]) -> Result<Vec<SessionId>, AppError> {
    raw.iter().map(|id| parse_session_id(id)).collect()
}

