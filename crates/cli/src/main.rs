//! Main entry point for the fieldcall CLI
//!
//! Inspects the local call queue, replays recorded telephony events and
//! drives uploads to the backend.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fieldcall::capture_core::logging::{log_welcome, setup_logging};
use fieldcall::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fieldcall", version, about = "Field staff call capture and sync")]
struct Cli {
    /// Configuration file (TOML); defaults to the user config dir when present
    #[arg(long, global = true, env = "FIELDCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List calls waiting for upload
    Pending,

    /// Show the most recent calls
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: u32,

        /// Hide calls to or from these numbers
        #[arg(long, num_args = 1..)]
        hide_excluded: Vec<String>,
    },

    /// Upload pending calls once
    Sync {
        #[arg(long, env = "FIELDCALL_TOKEN")]
        token: String,

        #[arg(long, env = "FIELDCALL_STAFF_ID")]
        staff_id: String,
    },

    /// Delete synced calls older than the retention period
    Purge {
        /// Defaults to the configured retention
        #[arg(long)]
        days: Option<u64>,
    },

    /// Feed recorded telephony events through the capturer
    Replay {
        /// One JSON telephony event per line
        #[arg(long)]
        events: PathBuf,

        /// JSON array of call-log entries
        #[arg(long)]
        call_log: PathBuf,

        #[arg(long)]
        staff_id: String,

        /// Upload each captured call right away with this token
        #[arg(long)]
        token: Option<String>,
    },

    /// Sync on the recurring schedule until Ctrl+C
    Run {
        /// Log in with this token; resumes the stored session when omitted
        #[arg(long, env = "FIELDCALL_TOKEN", requires = "staff_id")]
        token: Option<String>,

        #[arg(long, env = "FIELDCALL_STAFF_ID", requires = "token")]
        staff_id: Option<String>,
    },

    /// Stop syncing and forget the stored session
    Logout,
}

fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("fieldcall").join("config.toml");
    path.exists().then_some(path)
}

fn load_config(cli: &Cli) -> Result<FieldcallConfig> {
    let path = cli.config.clone().or_else(default_config_path);
    let mut config = FieldcallConfig::load(path.as_deref())
        .with_context(|| format!("Failed to load configuration from {:?}", path))?;

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    setup_logging(&config.logging)?;
    log_welcome("fieldcall", fieldcall::VERSION);

    let device = DeviceRuntime::open(config).await?;

    match cli.command {
        Commands::Pending => commands::pending::execute(&device).await,
        Commands::Recent {
            limit,
            hide_excluded,
        } => commands::recent::execute(&device, limit, &hide_excluded).await,
        Commands::Sync { token, staff_id } => {
            commands::sync::execute(&device, token, staff_id).await
        }
        Commands::Purge { days } => commands::purge::execute(&device, days).await,
        Commands::Replay {
            events,
            call_log,
            staff_id,
            token,
        } => commands::replay::execute(&device, &events, &call_log, staff_id, token).await,
        Commands::Run { token, staff_id } => commands::run::execute(&device, token, staff_id).await,
        Commands::Logout => commands::logout::execute(&device).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = execute(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
