//! Source abstraction layer
//!
//! Reports are written against the [`ReportSource`] trait so the exporter
//! can run over PostgreSQL or over an in-memory fixture in tests.

pub mod factory;
pub mod traits;

pub use factory::create_report_source;
pub use traits::ReportSource;
