//! Crate-wide result alias

use super::errors::RosterError;

/// Result of any fallible Roster operation
///
/// ```
/// use roster::domain::{Result, RosterError, TermId};
///
/// fn parse_term(raw: &str) -> Result<TermId> {
///     raw.parse().map_err(RosterError::Validation)
/// }
///
/// assert!(parse_term("14").is_ok());
/// assert!(parse_term("-1").is_err());
/// ```
pub type Result<T> = std::result::Result<T, RosterError>;
