//! Scalar cells and source rows
//!
//! A [`SourceRow`] is one record returned by the relational source, addressed
//! by column alias. An output row is an ordered `Vec<Cell>` whose arity matches
//! the report header exactly.

use crate::domain::errors::SourceError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Column alias every paged query exposes its keyset cursor under
pub const CURSOR_COLUMN: &str = "cursor_id";

/// One scalar field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Null,
    Int(i64),
    Text(String),
    Bool(bool),
    Time(DateTime<Utc>),
}

/// An output row
pub type Row = Vec<Cell>;

impl Cell {
    /// Text rendering used by the row sink
    ///
    /// Nulls render empty, booleans as `true`/`false`, times as RFC 3339 UTC
    /// with second precision.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Cell::Null => Cow::Borrowed(""),
            Cell::Int(v) => Cow::Owned(v.to_string()),
            Cell::Text(v) => Cow::Borrowed(v.as_str()),
            Cell::Bool(true) => Cow::Borrowed("true"),
            Cell::Bool(false) => Cow::Borrowed("false"),
            Cell::Time(t) => Cow::Owned(t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Int(_) => "integer",
            Cell::Text(_) => "text",
            Cell::Bool(_) => "boolean",
            Cell::Time(_) => "timestamp",
        }
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Cell::Int(i64::from(v))
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(v: DateTime<Utc>) -> Self {
        Cell::Time(v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// A record returned by the source, keyed by column alias
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceRow {
    columns: BTreeMap<String, Cell>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, column: &str, value: impl Into<Cell>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<Cell>) {
        self.columns.insert(column.to_string(), value.into());
    }

    fn cell(&self, column: &str) -> Result<&Cell, SourceError> {
        self.columns
            .get(column)
            .ok_or_else(|| SourceError::MissingColumn(column.to_string()))
    }

    fn mismatch(column: &str, cell: &Cell) -> SourceError {
        SourceError::UnexpectedType {
            column: column.to_string(),
            found: cell.type_name().to_string(),
        }
    }

    /// Keyset cursor of this row
    pub fn cursor(&self) -> Result<i64, SourceError> {
        self.id(CURSOR_COLUMN)
    }

    /// A non-null integer column
    pub fn id(&self, column: &str) -> Result<i64, SourceError> {
        match self.cell(column)? {
            Cell::Int(v) => Ok(*v),
            other => Err(Self::mismatch(column, other)),
        }
    }

    /// A nullable integer column
    pub fn opt_id(&self, column: &str) -> Result<Option<i64>, SourceError> {
        match self.cell(column)? {
            Cell::Null => Ok(None),
            Cell::Int(v) => Ok(Some(*v)),
            other => Err(Self::mismatch(column, other)),
        }
    }

    /// A nullable text column
    pub fn text(&self, column: &str) -> Result<Option<&str>, SourceError> {
        match self.cell(column)? {
            Cell::Null => Ok(None),
            Cell::Text(v) => Ok(Some(v.as_str())),
            other => Err(Self::mismatch(column, other)),
        }
    }

    /// A nullable text column, owned
    pub fn string(&self, column: &str) -> Result<Option<String>, SourceError> {
        Ok(self.text(column)?.map(str::to_string))
    }

    /// A boolean column; null reads as false
    pub fn flag(&self, column: &str) -> Result<bool, SourceError> {
        match self.cell(column)? {
            Cell::Null => Ok(false),
            Cell::Bool(v) => Ok(*v),
            other => Err(Self::mismatch(column, other)),
        }
    }

    /// A nullable timestamp column
    pub fn time(&self, column: &str) -> Result<Option<DateTime<Utc>>, SourceError> {
        match self.cell(column)? {
            Cell::Null => Ok(None),
            Cell::Time(v) => Ok(Some(*v)),
            other => Err(Self::mismatch(column, other)),
        }
    }

    /// Any column as-is, for pass-through fields
    pub fn raw(&self, column: &str) -> Result<Cell, SourceError> {
        self.cell(column).cloned()
    }

    /// Whether a column is present and non-null
    pub fn is_present(&self, column: &str) -> Result<bool, SourceError> {
        Ok(!self.cell(column)?.is_null())
    }
}
