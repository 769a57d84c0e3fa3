use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use planner::cli::{Cli, Commands, run_command};
use planner::{Config, Database, Profile, RestClient, utils};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Route tracing output to the log file; the TUI owns stdout.
fn init_logging(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "planner=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps a separate config and database
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(&utils::expand_path(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    init_logging(&config.get_log_path())?;
    info!(?profile, api = %config.api_base_url, "starting");

    let db_path = config.get_database_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| eyre!("Database path contains invalid UTF-8"))?,
    )?;

    let client = RestClient::new(&config.api_base_url, config.request_timeout())?;
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = planner::tui::App::new(config, utils::today())?;
            planner::tui::run_event_loop(app, Arc::new(client), runtime.handle().clone())?;
        }
        command => {
            let output = runtime.block_on(run_command(command, &client, &db, utils::today()))?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }
    }

    Ok(())
}
