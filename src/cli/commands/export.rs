//! Export command implementation
//!
//! This module implements the `export` command, which writes one CSV file
//! per enabled report.

use crate::adapters::database::create_report_source;
use crate::adapters::postgresql::PostgreSQLAdapter;
use crate::config::{load_config, RosterConfig};
use crate::core::export::ExportCoordinator;
use crate::domain::{ReportFormat, RosterError, UnresolvedLoginPolicy};
use clap::Args;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Dry run mode - count rows without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Override the requested reports (comma-separated)
    #[arg(long)]
    pub reports: Option<String>,

    /// Override the output format (sis or provisioning)
    #[arg(long)]
    pub format: Option<String>,

    /// Restrict to one enrollment term
    #[arg(long)]
    pub term: Option<i64>,

    /// Restrict to one sub-account tree
    #[arg(long)]
    pub sub_account: Option<i64>,

    /// Include soft-deleted records
    #[arg(long)]
    pub include_deleted: bool,

    /// Only records created by an SIS import
    #[arg(long)]
    pub created_by_sis: bool,

    /// Override the unresolved login policy (skip or fail)
    #[arg(long)]
    pub unresolved_login_policy: Option<String>,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<String>,
}

/// Exit code for an export error
pub fn exit_code_for(err: &RosterError) -> i32 {
    match err {
        RosterError::Configuration(_) | RosterError::Validation(_) => 2,
        e if e.is_connection() => 4,
        _ => 5,
    }
}

impl ExportArgs {
    /// Fold the command-line overrides into the loaded configuration
    pub fn apply_overrides(&self, config: &mut RosterConfig) -> Result<(), String> {
        if let Some(reports) = &self.reports {
            let names: Vec<String> = reports
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            tracing::info!(reports = ?names, "Overriding reports from CLI");
            config.report.reports = names;
        }

        if let Some(format) = &self.format {
            tracing::info!(format = %format, "Overriding report format from CLI");
            config.report.format = ReportFormat::from_str(format)?;
        }

        if let Some(policy) = &self.unresolved_login_policy {
            config.report.unresolved_login_policy = UnresolvedLoginPolicy::from_str(policy)?;
        }

        if self.term.is_some() {
            config.report.term_id = self.term;
        }
        if self.sub_account.is_some() {
            config.report.sub_account_id = self.sub_account;
        }
        if self.include_deleted {
            config.report.include_deleted = true;
        }
        if self.created_by_sis {
            config.report.created_by_sis = true;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
        Ok(())
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        if let Err(e) = self
            .apply_overrides(&mut config)
            .and_then(|_| config.validate())
        {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("❌ Configuration validation failed: {e}");
            return Ok(2);
        }

        let dry_run = config.application.dry_run;
        if dry_run {
            tracing::info!("Dry run mode enabled - no files will be written");
            println!("🔍 DRY RUN MODE - No files will be written");
            println!();
        }

        let source = match create_report_source(&config.database).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create report source");
                eprintln!("❌ Failed to initialize database connection: {e}");
                return Ok(exit_code_for(&e));
            }
        };
        if let Err(e) = source.test_connection().await {
            tracing::error!(error = %e, "Database connection failed");
            eprintln!("❌ Database connection failed: {e}");
            return Ok(4);
        }

        let coordinator = match ExportCoordinator::from_config(&config, Arc::clone(&source)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(exit_code_for(&e));
            }
        };

        println!("🚀 Starting export...");
        println!();

        let result = coordinator
            .run(&config.output, dry_run, shutdown_signal)
            .await;
        if let Some(pg) = source.as_any().downcast_ref::<PostgreSQLAdapter>() {
            let status = pg.client().pool_status();
            tracing::debug!(
                pool_size = status.size,
                pool_available = status.available,
                "Connection pool after export"
            );
        }
        let summary = match result {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("❌ Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        println!("📊 Export Summary:");
        println!("  Format: {}", summary.format);
        println!("  {}", summary.extra_text.trim_end());
        for outcome in &summary.reports {
            if !outcome.available {
                println!("  {:<18} not available in {} format", outcome.report, summary.format);
                continue;
            }
            let target = outcome
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(dry run)".to_string());
            println!(
                "  {:<18} {:>8} rows  {:>6} skipped  {}",
                outcome.report, outcome.rows, outcome.skipped, target
            );
        }
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!();

        let exit_code = if summary.interrupted {
            println!("⚠️  Export interrupted; the last file may be incomplete.");
            tracing::info!("Export interrupted by user signal");
            130
        } else {
            if summary.total_skipped() > 0 {
                println!(
                    "⚠️  {} rows skipped (unresolved logins)",
                    summary.total_skipped()
                );
            }
            println!("✅ Export completed successfully!");
            0
        };

        Ok(exit_code)
    }
}
