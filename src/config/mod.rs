//! Configuration management for Roster.
//!
//! # Overview
//!
//! Roster uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `ROSTER_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use roster::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("roster.toml")?;
//! println!("Root account: {}", config.report.root_account_id);
//! println!("Output: {}", config.output.directory);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level, dry run
//! - [`PostgreSQLConfig`] - source database connection
//! - [`ReportConfig`] - which reports, scope and flags
//! - [`OutputConfig`] - output directory, delimiter, manifest
//! - [`LoggingConfig`] - optional JSON file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [database]
//! connection_string = "${ROSTER_DATABASE_URL}"
//!
//! [report]
//! root_account_id = 1
//! term_id = 14
//! reports = ["users", "courses", "enrollments"]
//! format = "sis"
//!
//! [output]
//! directory = "./reports"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_str};
pub use schema::{
    ApplicationConfig, LoggingConfig, OutputConfig, PostgreSQLConfig, ReportConfig, RosterConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};

/// Serializes tests that touch process environment variables
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
