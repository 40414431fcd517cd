//! Parameterised SELECT builder with keyset pagination
//!
//! Every report query is a [`Select`]: a projection of `(expression, alias)`
//! pairs over a base relation, a list of joins and AND-ed conditions, and the
//! positional parameters those conditions bind. Pages are cut on a single
//! integer cursor expression, exposed under [`CURSOR_COLUMN`], so two runs
//! over unchanged data see rows in the same order.

use crate::domain::CURSOR_COLUMN;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// A bound query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

/// A report query under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    name: &'static str,
    cursor: String,
    columns: Vec<(String, String)>,
    from: String,
    joins: Vec<String>,
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl Select {
    /// Starts a query over `from`, paged on the integer expression `cursor`
    pub fn new(name: &'static str, from: impl Into<String>, cursor: impl Into<String>) -> Self {
        Self {
            name,
            cursor: cursor.into(),
            columns: Vec::new(),
            from: from.into(),
            joins: Vec::new(),
            conditions: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Name the query is registered under, usually the report name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn column(mut self, expr: impl Into<String>, alias: &str) -> Self {
        self.columns.push((expr.into(), alias.to_string()));
        self
    }

    pub fn columns(mut self, columns: &[(&str, &str)]) -> Self {
        for (expr, alias) in columns {
            self.columns.push(((*expr).to_string(), (*alias).to_string()));
        }
        self
    }

    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    /// Adds a join after construction, for joins that depend on the scope
    pub fn add_join(&mut self, clause: impl Into<String>) {
        self.joins.push(clause.into());
    }

    /// Appends a condition; all conditions are AND-ed
    pub fn filter(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    /// Binds a parameter and returns its placeholder (`$1`, `$2`, ...)
    pub fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// Output aliases in projection order, cursor first
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(CURSOR_COLUMN).chain(self.columns.iter().map(|(_, a)| a.as_str()))
    }

    /// Renders the unpaged statement
    pub fn render(&self) -> String {
        self.render_with(&self.conditions, None)
    }

    /// Renders one page: rows with a cursor strictly greater than `after`,
    /// in cursor order, at most `limit` of them
    pub fn page(&self, after: Option<i64>, limit: usize) -> (String, Vec<SqlParam>) {
        let mut params = self.params.clone();
        let mut conditions = self.conditions.clone();
        if let Some(after) = after {
            params.push(SqlParam::Int(after));
            conditions.push(format!("{} > ${}", self.cursor, params.len()));
        }
        (self.render_with(&conditions, Some(limit)), params)
    }

    fn render_with(&self, conditions: &[String], limit: Option<usize>) -> String {
        let mut sql = format!("SELECT {} AS {}", self.cursor, CURSOR_COLUMN);
        for (expr, alias) in &self.columns {
            let _ = write!(sql, ", {expr} AS {alias}");
        }
        let _ = write!(sql, " FROM {}", self.from);
        for join in &self.joins {
            let _ = write!(sql, " {join}");
        }
        if !conditions.is_empty() {
            let clauses: Vec<String> = conditions.iter().map(|c| format!("({c})")).collect();
            let _ = write!(sql, " WHERE {}", clauses.join(" AND "));
        }
        if let Some(limit) = limit {
            let _ = write!(sql, " ORDER BY {} LIMIT {limit}", self.cursor);
        }
        sql
    }
}
