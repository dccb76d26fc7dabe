//! Storyforge CLI - Turn requirement documents into user stories and test cases.

use clap::Parser;
use std::path::Path;
use storyforge_cli::commands;
use storyforge_cli::config::StoreBackend;
use storyforge_cli::{Cli, Command, Config, Formatter};
use storyforge_domain::RecordStore;
use storyforge_extractor::Extractor;
use storyforge_llm::ModelRegistry;
use storyforge_store::{MemoryStore, SqliteStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> storyforge_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing (log to stderr so stdout stays machine-readable)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::path()?,
    };
    let config = Config::load_from(&config_path)?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Config(args) => commands::execute_config(args, &config, &config_path, &formatter),
        command => match config.store.backend {
            StoreBackend::Sqlite => {
                let path = config.database_path()?;
                ensure_parent(&path)?;
                info!("Using SQLite store at {}", path.display());
                let store = SqliteStore::new(&path)?;
                dispatch(command, &config, store, &formatter).await
            }
            StoreBackend::Memory => {
                warn!("Using in-memory store, records are discarded on exit");
                dispatch(command, &config, MemoryStore::new(), &formatter).await
            }
        },
    }
}

/// Build the extractor over `store` and run a record-producing command.
async fn dispatch<S>(
    command: Command,
    config: &Config,
    store: S,
    formatter: &Formatter,
) -> storyforge_cli::Result<()>
where
    S: RecordStore + 'static,
{
    let registry = ModelRegistry::from_config(&config.model)?;
    let extractor = Extractor::from_registry(&registry, store, config.extractor.clone())?;

    // Ctrl-C stops dispatching; chunks already running still finish and are reported
    let token = extractor.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight chunks");
            token.cancel();
        }
    });

    match command {
        Command::Extract(args) => commands::execute_extract(args, &extractor, formatter).await,
        Command::TestCases(args) => commands::execute_test_cases(args, &extractor, formatter).await,
        Command::Config(_) => Ok(()),
    }
}

fn ensure_parent(path: &Path) -> storyforge_cli::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
