//! Core business logic for Roster.
//!
//! # Modules
//!
//! - [`report`] - Report catalog entries: headers, scoped queries, row assembly
//! - [`export`] - Streaming, dispatch, the CSV sink and the export summary
//!
//! # Export Workflow
//!
//! 1. **Resolve scope**: load the root account, optional sub-account and term,
//!    and the root's trusted accounts
//! 2. **Dispatch**: intersect the request with the catalog and open one stream
//!    per enabled report
//! 3. **Stream**: each stream pages its query by keyset cursor and assembles
//!    rows one batch at a time
//! 4. **Write**: the sink pulls rows into `<report>.csv` until the stream ends
//!    or shutdown is requested
//! 5. **Report**: log the summary and write the manifest
//!
//! # Example
//!
//! ```rust,no_run
//! use roster::adapters::database::create_report_source;
//! use roster::config::load_config;
//! use roster::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("roster.toml")?;
//! let source = create_report_source(&config.database).await?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = ExportCoordinator::from_config(&config, source)?;
//! let summary = coordinator.run(&config.output, false, shutdown_rx).await?;
//!
//! println!("Rows: {}", summary.total_rows());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod report;
