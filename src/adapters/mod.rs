//! Data source integrations for Roster.
//!
//! - [`database`] - The [`database::ReportSource`] abstraction and its factory
//! - [`postgresql`] - PostgreSQL implementation
//!
//! Reports are written against the trait so the exporter can be driven by an
//! in-memory source in tests:
//!
//! ```rust,no_run
//! use roster::adapters::database::create_report_source;
//! use roster::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("roster.toml")?;
//! let source = create_report_source(&config.database).await?;
//! source.test_connection().await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod postgresql;
