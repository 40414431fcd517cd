//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Roster configuration file.

use crate::config::load_config;
use crate::domain::ReportKind;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        let request = match config.report.to_request() {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };
        let enabled: Vec<&str> = request.enabled().into_iter().map(ReportKind::as_str).collect();
        let ignored: Vec<&String> = config
            .report
            .reports
            .iter()
            .filter(|name| ReportKind::parse(name).is_none())
            .collect();

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Database: {}",
            config.database.connection_string.expose_secret().redacted_url()
        );
        println!("  Max Connections: {}", config.database.max_connections);
        println!("  SSL Mode: {}", config.database.ssl_mode);
        println!("  Root Account: {}", config.report.root_account_id);
        if let Some(sub) = config.report.sub_account_id {
            println!("  Sub-account: {sub}");
        }
        if let Some(term) = config.report.term_id {
            println!("  Term: {term}");
        }
        println!("  Format: {}", config.report.format);
        println!("  Reports: {}", enabled.join(", "));
        if !ignored.is_empty() {
            println!("  ⚠️  Ignored (unknown): {ignored:?}");
        }
        println!("  Created by SIS only: {}", config.report.created_by_sis);
        println!("  Include deleted: {}", config.report.include_deleted);
        println!(
            "  Unresolved logins: {}",
            config.report.unresolved_login_policy
        );
        println!("  Output Directory: {}", config.output.directory);
        println!();
        Ok(0)
    }
}
