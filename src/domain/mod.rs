//! Domain models and types for Roster.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`AccountId`], [`TermId`])
//! - **The report catalog** ([`ReportKind`], [`ReportFormat`], [`ReportRequest`])
//! - **Row values** ([`Cell`], [`SourceRow`])
//! - **Status vocabularies** ([`EnrollmentState`] and course/role mappings)
//! - **Error types** ([`RosterError`], [`SourceError`])
//! - **Result type alias** ([`Result`])
//!
//! # Catalog intersection
//!
//! ```rust
//! use roster::domain::{ReportKind, ReportRequest};
//!
//! let request = ReportRequest::new(["groups", "users", "not_a_report"]);
//! assert_eq!(request.enabled(), vec![ReportKind::Users, ReportKind::Groups]);
//! ```

pub mod catalog;
pub mod errors;
pub mod ids;
pub mod records;
pub mod result;
pub mod row;
pub mod status;

// Re-export commonly used types for convenience
pub use catalog::{
    value_to_boolean, ReportFormat, ReportKind, ReportRequest, UnresolvedLoginPolicy,
};
pub use errors::{RosterError, SourceError};
pub use ids::{AccountId, TermId};
pub use records::{AccountRecord, LoginRecord, TermRecord};
pub use result::Result;
pub use row::{Cell, Row, SourceRow, CURSOR_COLUMN};
pub use status::{name_parts, EnrollmentState, NameParts};
