//! Portal CLI - talk to the Atelier admin portal API from a terminal

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use portal_client::{AuthApi, Environment, FileStorage, PortalClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Atelier admin portal client")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Directory holding the session file
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to <config_dir>/portal/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.into())?;

    let client_config = config::load_client_config(cli.config.as_deref())?;
    let state_dir = config::state_dir(cli.data_dir);
    let session_file = config::session_file(&state_dir);
    debug!(api = %client_config.api_url(), session = %session_file.display(), "Loaded configuration");

    // A terminal has persistent storage but nowhere to redirect to
    let environment =
        Environment::headless().with_storage(Arc::new(FileStorage::new(&session_file)));
    let client = PortalClient::new(client_config, environment)?;
    let api = AuthApi::new(client);

    if let Err(e) = cli.command.execute(&api, session_file).await {
        error!("Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
