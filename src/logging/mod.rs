//! Logging and observability
//!
//! Structured logging with:
//! - Configurable log levels
//! - Human-readable console output
//! - Optional JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use roster::logging::init_logging;
//! use roster::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Export started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of one report stream
///
/// # Example
///
/// ```no_run
/// use roster::log_report_start;
/// use roster::domain::{ReportFormat, ReportKind};
///
/// log_report_start!(ReportKind::Users, ReportFormat::Sis);
/// ```
#[macro_export]
macro_rules! log_report_start {
    ($kind:expr, $format:expr) => {
        tracing::info!(
            report = %$kind,
            format = %$format,
            "Starting report"
        );
    };
}

/// Log the completion of one report stream
///
/// # Example
///
/// ```no_run
/// use roster::log_report_complete;
/// use roster::domain::ReportKind;
/// use std::time::Duration;
///
/// log_report_complete!(ReportKind::Users, 42, 0, Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_report_complete {
    ($kind:expr, $rows:expr, $skipped:expr, $duration:expr) => {
        tracing::info!(
            report = %$kind,
            rows = $rows,
            skipped = $skipped,
            duration_ms = $duration.as_millis() as u64,
            "Report completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use roster::log_error_with_context;
/// use roster::domain::RosterError;
///
/// let error = RosterError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log one fetched page of source rows
///
/// # Example
///
/// ```no_run
/// use roster::log_batch_fetched;
///
/// log_batch_fetched!("enrollments", 1000, Some(5_000_i64));
/// ```
#[macro_export]
macro_rules! log_batch_fetched {
    ($name:expr, $rows:expr, $after:expr) => {
        tracing::debug!(
            query = $name,
            rows = $rows,
            after = ?$after,
            "Fetched batch"
        );
    };
}
