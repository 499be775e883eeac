//! Binary entry point for waypost.
//!
//! This binary drives a destination collection end-to-end against the
//! configured backend.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use waypost::backend::AnyBackend;
use waypost::config::{BackendKind, WaypostConfig};
use waypost::models::{CatalogDocument, Destination, DestinationDraft, DestinationPatch};
use waypost::services::{Fetcher, SyncController};

/// Waypost - client-side synchronization for destination catalogs.
#[derive(Parser)]
#[command(name = "waypost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend variant: http, rest, local, or session.
    #[arg(short, long, global = true, env = "WAYPOST_BACKEND")]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// List the collection.
    List,

    /// Add a destination.
    Add {
        /// Display name.
        name: String,

        /// Description.
        description: String,
    },

    /// Edit a destination.
    Edit {
        /// The record id to edit.
        id: u64,

        /// New display name.
        #[arg(long)]
        name: Option<String>,

        /// New description.
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a destination.
    Remove {
        /// The record id to remove.
        id: u64,
    },

    /// Fetch a read-only static catalog document.
    Fetch {
        /// Document URL (default: `{base_url}/data.json`).
        url: Option<String>,
    },

    /// Show status.
    Status,

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load a .env file if one is present; ignore its absence.
    let _ = dotenvy::dotenv();

    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Initializes the tracing subscriber.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "waypost=debug" } else { "waypost=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves the configuration from file, environment, and CLI flags.
fn load_config(cli: &Cli) -> waypost::Result<WaypostConfig> {
    let mut config = match &cli.config {
        Some(path) => WaypostConfig::load_from_file(path)?.with_env_overrides(),
        None => WaypostConfig::load_default(),
    };

    if let Some(backend) = &cli.backend {
        config = config.with_backend(BackendKind::parse(backend));
    }

    Ok(config)
}

/// Dispatches the parsed command.
async fn run(command: Commands, config: WaypostConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::List => cmd_list(&config).await,
        Commands::Add { name, description } => cmd_add(&config, name, description).await,
        Commands::Edit {
            id,
            name,
            description,
        } => cmd_edit(&config, id, name, description).await,
        Commands::Remove { id } => cmd_remove(&config, id).await,
        Commands::Fetch { url } => cmd_fetch(&config, url).await,
        Commands::Status => cmd_status(&config),
        Commands::Config { show } => cmd_config(&config, show),
    }
}

/// Builds a mounted controller for the configured backend.
async fn mounted_controller(
    config: &WaypostConfig,
) -> Result<SyncController<AnyBackend>, Box<dyn std::error::Error>> {
    let backend = AnyBackend::from_config(config)?;
    let mut controller = SyncController::new(backend);
    controller.mount().await;
    Ok(controller)
}

/// Fails when the last operation recorded a failure.
fn ensure_ok(controller: &SyncController<AnyBackend>) -> Result<(), Box<dyn std::error::Error>> {
    match controller.failure() {
        Some(message) => Err(message.to_string().into()),
        None => Ok(()),
    }
}

fn print_items(items: &[Destination]) {
    if items.is_empty() {
        println!("No destinations.");
        return;
    }
    for item in items {
        println!("{:>4}  {}: {}", item.id, item.name, item.description);
    }
}

/// List command.
async fn cmd_list(config: &WaypostConfig) -> Result<(), Box<dyn std::error::Error>> {
    let controller = mounted_controller(config).await?;
    ensure_ok(&controller)?;
    print_items(controller.items());
    Ok(())
}

/// Add command.
async fn cmd_add(
    config: &WaypostConfig,
    name: String,
    description: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let draft = DestinationDraft::new(name, description);

    // Validation runs here, before the controller ever sees the draft.
    let report = draft.validate();
    if !report.is_ok() {
        return Err(report.summary().into());
    }

    let mut controller = mounted_controller(config).await?;
    ensure_ok(&controller)?;

    controller.create(draft).await;
    ensure_ok(&controller)?;

    if let Some(created) = controller.items().last() {
        println!("Added {:>4}  {}: {}", created.id, created.name, created.description);
    }
    Ok(())
}

/// Edit command.
async fn cmd_edit(
    config: &WaypostConfig,
    id: u64,
    name: Option<String>,
    description: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let patch = DestinationPatch { name, description };
    if patch.is_empty() {
        return Err("nothing to change: pass --name and/or --description".into());
    }
    if let Some(new_name) = &patch.name {
        if new_name.trim().is_empty() {
            return Err("name: name is required".into());
        }
    }
    if let Some(new_description) = &patch.description {
        if new_description.trim().is_empty() {
            return Err("description: description is required".into());
        }
    }

    let mut controller = mounted_controller(config).await?;
    ensure_ok(&controller)?;

    let known = controller.items().iter().any(|item| item.id == id);
    controller.update(id, patch).await;
    ensure_ok(&controller)?;

    if known {
        if let Some(updated) = controller.items().iter().find(|item| item.id == id) {
            println!(
                "Updated {:>4}  {}: {}",
                updated.id, updated.name, updated.description
            );
        }
    } else {
        println!("No destination with id {id}; nothing changed.");
    }
    Ok(())
}

/// Remove command.
async fn cmd_remove(config: &WaypostConfig, id: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = mounted_controller(config).await?;
    ensure_ok(&controller)?;

    let before = controller.items().len();
    controller.remove(id).await;
    ensure_ok(&controller)?;

    if controller.items().len() < before {
        println!("Removed destination {id}.");
    } else {
        println!("No destination with id {id}; nothing changed.");
    }
    Ok(())
}

/// Fetch command.
async fn cmd_fetch(
    config: &WaypostConfig,
    url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = url.unwrap_or_else(|| {
        format!("{}/data.json", config.api.base_url.trim_end_matches('/'))
    });

    let mut fetcher: Fetcher<CatalogDocument> = Fetcher::new(url);
    fetcher.fetch().await;

    if let Some(message) = fetcher.failure() {
        return Err(message.to_string().into());
    }

    match fetcher.into_data() {
        Some(document) => {
            print_items(&document.into_destinations());
            Ok(())
        },
        None => Err("catalog fetch produced no document".into()),
    }
}

/// Status command.
fn cmd_status(config: &WaypostConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Waypost Status");
    println!("==============");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Backend: {}", config.backend);
    println!("  API base URL: {}", config.api.base_url);

    let data_status = if config.data_dir.exists() {
        "Configured"
    } else {
        "Will be created on first use"
    };
    println!("Data Directory: {data_status}");
    println!("  Path: {}", config.data_dir.display());

    let collection_path = config
        .data_dir
        .join(format!("{}.json", config.collection_key));
    let collection_status = if collection_path.exists() {
        "Available"
    } else {
        "Not initialized"
    };
    println!("Local Collection: {collection_status}");
    println!("  Key: {}", config.collection_key);

    println!();
    println!("Use 'waypost config --show' to view full configuration");

    Ok(())
}

/// Config command.
fn cmd_config(config: &WaypostConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("backend = \"{}\"", config.backend);
        println!("data_dir = \"{}\"", config.data_dir.display());
        println!("collection_key = \"{}\"", config.collection_key);
        println!();
        println!("[api]");
        println!("base_url = \"{}\"", config.api.base_url);
        if let Some(timeout_ms) = config.api.timeout_ms {
            println!("timeout_ms = {timeout_ms}");
        }
        if let Some(connect_timeout_ms) = config.api.connect_timeout_ms {
            println!("connect_timeout_ms = {connect_timeout_ms}");
        }
    } else {
        println!("Pass --show to print the resolved configuration.");
    }
    Ok(())
}
