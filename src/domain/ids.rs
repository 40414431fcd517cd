//! Domain identifier types
//!
//! Newtype wrappers for the internal numeric identifiers the exporter passes
//! around, so that an account id cannot be handed to something expecting a
//! term id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Internal account identifier
///
/// # Examples
///
/// ```
/// use roster::domain::ids::AccountId;
/// use std::str::FromStr;
///
/// let id = AccountId::from_str("42").unwrap();
/// assert_eq!(id.get(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    /// Creates a new AccountId, rejecting non-positive values
    pub fn new(id: i64) -> Result<Self, String> {
        if id <= 0 {
            return Err(format!("Account ID must be positive, got {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the raw identifier
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("Invalid account ID '{s}': {e}"))?;
        Self::new(id)
    }
}

/// Internal enrollment term identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(i64);

impl TermId {
    /// Creates a new TermId, rejecting non-positive values
    pub fn new(id: i64) -> Result<Self, String> {
        if id <= 0 {
            return Err(format!("Term ID must be positive, got {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the raw identifier
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TermId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("Invalid term ID '{s}': {e}"))?;
        Self::new(id)
    }
}
