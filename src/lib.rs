// Roster - LMS enrollment data exporter
// Copyright (c) 2025 Roster Contributors
// Licensed under the MIT License

//! # Roster - LMS enrollment data exporter
//!
//! Roster exports the roster of a learning management system (users,
//! accounts, terms, courses, sections, enrollments, groups, cross-listings
//! and observers) as CSV files, either in the strict SIS import format or in
//! the fuller provisioning format.
//!
//! ## Overview
//!
//! - **Select** a subset of the fixed report catalog
//! - **Scope** every report to a root account, optionally a sub-account tree
//!   and a term, with created-by-SIS and include-deleted toggles
//! - **Stream** each report in keyset-paged batches, never holding a whole
//!   report in memory
//! - **Write** one CSV per report plus a JSON manifest
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Report definitions, streaming and export coordination
//! - [`adapters`] - The report source trait and its PostgreSQL implementation
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roster::adapters::database::create_report_source;
//! use roster::config::load_config;
//! use roster::core::export::{ExportCoordinator, ReportSet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("roster.toml")?;
//!     let source = create_report_source(&config.database).await?;
//!     let coordinator = ExportCoordinator::from_config(&config, source)?;
//!
//!     let output = coordinator.prepare().await?;
//!     println!("{}", output.extra_text);
//!     if let ReportSet::Single(mut stream) = output.reports {
//!         while let Some(row) = stream.next_row().await {
//!             println!("{:?}", row?);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`] with [`domain::RosterError`];
//! query failures surface as [`domain::SourceError`] and end the report that
//! raised them.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
