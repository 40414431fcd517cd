// Roster - LMS enrollment data exporter
// Copyright (c) 2025 Roster Contributors
// Licensed under the MIT License

use clap::Parser;
use roster::cli::{Cli, Commands};
use roster::config::{load_config, LoggingConfig};
use roster::logging::init_logging;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // File logging and the default level come from the config file when it
    // loads; the command itself reports config errors
    let file_config = match &cli.command {
        Commands::Init(_) | Commands::Reports(_) => None,
        _ => load_config(&cli.config).ok(),
    };
    let (config_level, logging_config) = match file_config {
        Some(config) => (Some(config.application.log_level), config.logging),
        None => (None, LoggingConfig::default()),
    };
    let log_level = cli
        .log_level
        .clone()
        .or(config_level)
        .unwrap_or_else(|| "info".to_string());

    let log_guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Roster - LMS enrollment data exporter"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Some(signal) = wait_for_signal().await {
            tracing::info!(signal, "Shutdown requested");
            eprintln!("\n⚠️  {signal} received, finishing the current row...");
            shutdown_tx.send_replace(true);
        }
    });

    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // Flush the file appender before exiting
    drop(log_guard);
    process::exit(exit_code);
}

/// Resolves with the name of the first SIGINT/SIGTERM, `None` if no handler
/// could be installed
async fn wait_for_signal() -> Option<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                return None;
            }
        };
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.ok().map(|_| "SIGINT"),
            _ = sigterm.recv() => Some("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some("Ctrl+C"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                None
            }
        }
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Export(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
        Commands::Reports(args) => args.execute().await,
    }
}
