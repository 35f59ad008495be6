//! Cooksync - import recipes into a notes vault
//!
//! This is the command-line host for the cooksync sync core. It plays the
//! part of the host application: it owns the settings, shows notices, and
//! runs the startup lifecycle.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use cooksync::{
    Collaborators, FsVault, JsonKeyValueStore, JsonStateStore, LogNotifier, ServiceConfig,
    SyncController, SyncOutcome, SyncState, SyncTrigger, SystemBrowser, UreqTransport,
    should_auto_sync_on_startup,
};
use log::{debug, error};

/// Import Cooksync recipes into a vault as markdown files.
#[derive(Parser)]
#[command(name = "cooksync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Vault directory recipes are written into
    #[arg(global = true, long, env = "COOKSYNC_VAULT")]
    vault: Option<PathBuf>,

    /// Sync state file (defaults to ~/.config/cooksync/state.json)
    #[arg(global = true, long)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize this client in the browser and store the token
    Connect,

    /// Forget the stored token
    Disconnect,

    /// Import new recipes now
    Sync,

    /// Show connection and sync status
    Status,

    /// Set the vault folder new recipes are written to
    SetDir {
        /// Vault-relative folder; empty restores the default
        dir: String,
    },

    /// Turn sync on startup on or off
    AutoSync {
        #[arg(value_enum)]
        mode: Toggle,
    },

    /// Open the recipe import customization page
    Customize,

    /// Startup lifecycle: sync if auto-sync is enabled and due
    Start,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let controller = open_controller(&cli)?;

    match cli.command {
        Commands::Connect => controller.connect()?,
        Commands::Disconnect => controller.disconnect()?,
        Commands::Sync => report(controller.start_sync(SyncTrigger::Command)?),
        Commands::Status => print_status(&controller.snapshot(), &controller.client_id()?),
        Commands::SetDir { dir } => {
            let dir = controller.update_target_dir(&dir)?;
            println!("Recipes will be written to {}", dir);
        }
        Commands::AutoSync { mode } => {
            controller.set_auto_sync_on_start(matches!(mode, Toggle::On))?;
        }
        Commands::Customize => controller
            .open_customize_page()
            .context("Failed to open the customization page")?,
        Commands::Start => match controller.on_startup()? {
            Some(outcome) => report(outcome),
            None => debug!("Nothing to do on startup"),
        },
    }

    Ok(())
}

fn open_controller(cli: &Cli) -> Result<SyncController> {
    let service = ServiceConfig::load().context("Failed to load service configuration")?;
    debug!("Using Cooksync service at {}", service.base_url);

    let vault_root = match &cli.vault {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    let state_store = match &cli.state_file {
        Some(path) => JsonStateStore::new(path),
        None => JsonStateStore::default_location()?,
    };
    debug!("State file: {}", state_store.path().display());

    let controller = SyncController::load(
        service,
        Box::new(state_store),
        Collaborators {
            transport: Box::new(UreqTransport::new()),
            vault: Box::new(FsVault::new(&vault_root)?),
            local_store: Box::new(JsonKeyValueStore::default_location()?),
            notifier: Box::new(LogNotifier),
            browser: Box::new(SystemBrowser),
        },
    )?;
    Ok(controller)
}

fn report(outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::NotAuthenticated => {
            println!("Not connected. Run `cooksync connect` first.");
        }
        SyncOutcome::Completed(stats) => {
            for path in stats.report.written_paths() {
                println!("  {}", path);
            }
            println!(
                "{} recipe(s) imported, {} failed in {}ms",
                stats.recipes_written(),
                stats.write_failures(),
                stats.duration_ms
            );
        }
        SyncOutcome::AlreadyInProgress | SyncOutcome::UpToDate => {}
    }
}

fn print_status(state: &SyncState, client_id: &str) {
    let connected = if state.is_authenticated() {
        "connected"
    } else {
        "not connected"
    };
    let last_sync = state
        .last_sync_time
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("Account:         {}", connected);
    println!("Client id:       {}", client_id);
    println!("Folder:          {}", state.target_dir);
    println!("Imported:        {} recipe(s)", state.imported_recipe_ids.len());
    println!("Last sync:       {}", last_sync);
    if state.last_sync_failed {
        println!("Last result:     failed");
    }
    println!(
        "Sync on start:   {}{}",
        if state.auto_sync_on_start { "on" } else { "off" },
        if should_auto_sync_on_startup(state) {
            " (due)"
        } else {
            ""
        }
    );
}
