//! Domain error types
//!
//! This module defines the error hierarchy for Roster. Errors raised by the
//! query layer are wrapped in [`SourceError`] so that no driver types leak
//! into the rest of the crate.

use thiserror::Error;

/// Main Roster error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Relational source errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Database-related errors (pool setup, driver plumbing)
    #[error("Database error: {0}")]
    Database(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors (scope or request does not make sense)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while reading from the relational source
///
/// These are fatal to the report stream that triggered them and are
/// propagated unchanged; the exporter never retries.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the source database
    #[error("Failed to connect to source: {0}")]
    ConnectionFailed(String),

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Statement timeout
    #[error("Query timeout: {0}")]
    Timeout(String),

    /// A column expected by the report was not returned
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column had a type the report cannot use
    #[error("Unexpected type for column {column}: {found}")]
    UnexpectedType { column: String, found: String },

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RosterError {
    /// Whether the error means the source could not be reached at all
    pub fn is_connection(&self) -> bool {
        matches!(self, RosterError::Source(SourceError::ConnectionFailed(_)))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        RosterError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RosterError {
    fn from(err: serde_json::Error) -> Self {
        RosterError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RosterError {
    fn from(err: toml::de::Error) -> Self {
        RosterError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv writer errors
impl From<csv::Error> for RosterError {
    fn from(err: csv::Error) -> Self {
        RosterError::Io(format!("CSV write failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_error_display() {
        let err = RosterError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_source_error_conversion() {
        let source_err = SourceError::QueryFailed("syntax error".to_string());
        let err: RosterError = source_err.into();
        assert!(matches!(err, RosterError::Source(_)));
        assert_eq!(err.to_string(), "Source error: Query failed: syntax error");
    }

    #[test]
    fn test_unexpected_type_display() {
        let err = SourceError::UnexpectedType {
            column: "user_id".to_string(),
            found: "text".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected type for column user_id: text");
    }

    #[test]
    fn test_is_connection() {
        let err: RosterError = SourceError::ConnectionFailed("refused".to_string()).into();
        assert!(err.is_connection());
        assert!(!RosterError::Export("x".to_string()).is_connection());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: RosterError = io_err.into();
        assert!(matches!(err, RosterError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: RosterError = json_err.into();
        assert!(matches!(err, RosterError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: RosterError = toml_err.into();
        assert!(matches!(err, RosterError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_roster_error_implements_std_error() {
        let err = RosterError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
