//! Export orchestration and batch streaming
//!
//! This module provides the core export logic for Roster, including:
//! - Keyset-paged row streams per report
//! - Export coordination and dispatch
//! - The CSV row sink
//! - Summary and manifest

pub mod batch;
pub mod coordinator;
pub mod sink;
pub mod summary;

pub use batch::{ReportStream, StreamStats, DEFAULT_BATCH_SIZE};
pub use coordinator::{extra_text, ExportCoordinator, ExportOutput, ReportSet};
pub use sink::{CsvSink, SinkOutcome};
pub use summary::{ExportSummary, ReportOutcome, MANIFEST_FILE};
