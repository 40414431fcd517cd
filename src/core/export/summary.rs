//! Export summary and manifest
//!
//! This module defines structures for tracking and reporting export results.

use crate::domain::{ReportFormat, ReportKind, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Manifest file name written next to the report files
pub const MANIFEST_FILE: &str = "manifest.json";

/// Result of one report in an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportOutcome {
    pub report: ReportKind,

    /// `false` when the report does not exist in the requested format
    pub available: bool,

    /// Data rows produced (header excluded)
    pub rows: u64,

    /// Source rows left out under the unresolved login policy
    pub skipped: u64,

    /// Written file, `None` for dry runs and unavailable reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ReportOutcome {
    pub fn unavailable(report: ReportKind) -> Self {
        Self {
            report,
            available: false,
            rows: 0,
            skipped: 0,
            file: None,
        }
    }
}

/// Summary of an export operation
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub format: ReportFormat,

    /// Human-readable description of the request
    pub extra_text: String,

    /// Per-report outcomes, in catalog order
    pub reports: Vec<ReportOutcome>,

    /// Duration of the export
    pub duration: Duration,

    /// Stopped early on a shutdown signal
    pub interrupted: bool,

    pub dry_run: bool,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new(format: ReportFormat, extra_text: impl Into<String>, dry_run: bool) -> Self {
        Self {
            format,
            extra_text: extra_text.into(),
            reports: Vec::new(),
            duration: Duration::from_secs(0),
            interrupted: false,
            dry_run,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_report(&mut self, outcome: ReportOutcome) {
        self.reports.push(outcome);
    }

    pub fn total_rows(&self) -> u64 {
        self.reports.iter().map(|r| r.rows).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.reports.iter().map(|r| r.skipped).sum()
    }

    /// Check if the export ran to completion
    pub fn is_successful(&self) -> bool {
        !self.interrupted
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            format = %self.format,
            reports = self.reports.len(),
            total_rows = self.total_rows(),
            skipped = self.total_skipped(),
            duration_secs = self.duration.as_secs(),
            dry_run = self.dry_run,
            summary = %self.extra_text,
            "Export completed"
        );

        for outcome in self.reports.iter().filter(|r| !r.available) {
            tracing::info!(
                report = %outcome.report,
                format = %self.format,
                "Report not available in this format"
            );
        }

        if self.interrupted {
            tracing::warn!("Export interrupted before all reports were written");
        }
    }

    /// Serialize the manifest into `directory`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_manifest(&self, directory: &Path) -> Result<PathBuf> {
        let manifest = Manifest {
            generated_at: Utc::now(),
            format: self.format,
            summary: &self.extra_text,
            interrupted: self.interrupted,
            reports: &self.reports,
        };
        let path = directory.join(MANIFEST_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
        tracing::debug!(path = %path.display(), "Wrote manifest");
        Ok(path)
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    generated_at: DateTime<Utc>,
    format: ReportFormat,
    summary: &'a str,
    interrupted: bool,
    reports: &'a [ReportOutcome],
}
