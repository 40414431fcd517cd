//! Command line
//!
//! Global flags (`--config`, `--log-level`) come before the subcommand;
//! every subcommand returns the process exit code.

pub mod commands;

use clap::{Parser, Subcommand};

/// Roster - LMS enrollment data exporter
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
#[command(author = "Roster Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "roster.toml", env = "ROSTER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ROSTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the configured reports to CSV files
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// List the report catalog and header contracts
    Reports(commands::reports::ReportsArgs),
}
