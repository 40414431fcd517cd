//! Report catalog and report requests
//!
//! The catalog is the fixed, ordered list of report types the exporter knows
//! how to produce. A [`ReportRequest`] names a subset of it plus the flags that
//! shape every report.

use crate::domain::ids::{AccountId, TermId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A report type from the fixed catalog
///
/// Variant order is catalog order; `Ord` follows it, so ordered collections
/// keyed by `ReportKind` iterate in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Users,
    Accounts,
    Terms,
    Courses,
    Sections,
    Enrollments,
    Groups,
    GroupMembership,
    GroupCategories,
    Xlist,
    UserObservers,
}

impl ReportKind {
    /// The full catalog, in order
    pub const CATALOG: [ReportKind; 11] = [
        ReportKind::Users,
        ReportKind::Accounts,
        ReportKind::Terms,
        ReportKind::Courses,
        ReportKind::Sections,
        ReportKind::Enrollments,
        ReportKind::Groups,
        ReportKind::GroupMembership,
        ReportKind::GroupCategories,
        ReportKind::Xlist,
        ReportKind::UserObservers,
    ];

    /// Report name as used in requests and output file names
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Users => "users",
            ReportKind::Accounts => "accounts",
            ReportKind::Terms => "terms",
            ReportKind::Courses => "courses",
            ReportKind::Sections => "sections",
            ReportKind::Enrollments => "enrollments",
            ReportKind::Groups => "groups",
            ReportKind::GroupMembership => "group_membership",
            ReportKind::GroupCategories => "group_categories",
            ReportKind::Xlist => "xlist",
            ReportKind::UserObservers => "user_observers",
        }
    }

    /// Looks up a catalog entry by exact name
    pub fn parse(name: &str) -> Option<Self> {
        Self::CATALOG.into_iter().find(|k| k.as_str() == name)
    }

    /// Intersects requested names with the catalog
    ///
    /// Catalog order wins over request order, duplicates collapse, and names
    /// outside the catalog are dropped.
    pub fn enabled<S: AsRef<str>>(requested: &[S]) -> Vec<ReportKind> {
        Self::CATALOG
            .into_iter()
            .filter(|kind| requested.iter().any(|name| name.as_ref() == kind.as_str()))
            .collect()
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown report '{s}'"))
    }
}

/// Output format shared by every report in one export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Strict bulk-import contract: fixed header names, no internal ids
    Sis,
    /// Audit output: internal ids and descriptive columns included
    #[default]
    Provisioning,
}

impl ReportFormat {
    pub fn is_strict(self) -> bool {
        self == ReportFormat::Sis
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Sis => f.write_str("sis"),
            ReportFormat::Provisioning => f.write_str("provisioning"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sis" | "sis_export" => Ok(ReportFormat::Sis),
            "provisioning" => Ok(ReportFormat::Provisioning),
            other => Err(format!(
                "Invalid report format '{other}'. Must be one of: sis, provisioning"
            )),
        }
    }
}

/// What to do with an enrollment whose user has no resolvable login in any
/// trusted account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedLoginPolicy {
    /// Drop the row (strict format) or leave the external id empty
    #[default]
    Skip,
    /// Abort the enrollments stream
    Fail,
}

impl fmt::Display for UnresolvedLoginPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedLoginPolicy::Skip => f.write_str("skip"),
            UnresolvedLoginPolicy::Fail => f.write_str("fail"),
        }
    }
}

impl FromStr for UnresolvedLoginPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(UnresolvedLoginPolicy::Skip),
            "fail" => Ok(UnresolvedLoginPolicy::Fail),
            other => Err(format!(
                "Invalid unresolved_login_policy '{other}'. Must be one of: skip, fail"
            )),
        }
    }
}

/// One export invocation's request
///
/// `reports` is kept as the raw requested names; [`ReportRequest::enabled`]
/// applies the catalog intersection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportRequest {
    pub reports: Vec<String>,
    pub format: ReportFormat,
    pub created_by_sis: bool,
    pub include_deleted: bool,
    pub term: Option<TermId>,
    pub sub_account: Option<AccountId>,
}

impl ReportRequest {
    /// Creates a request for the given report names in provisioning format
    pub fn new<I, S>(reports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reports: reports.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_created_by_sis(mut self, created_by_sis: bool) -> Self {
        self.created_by_sis = created_by_sis;
        self
    }

    pub fn with_include_deleted(mut self, include_deleted: bool) -> Self {
        self.include_deleted = include_deleted;
        self
    }

    pub fn with_term(mut self, term: Option<TermId>) -> Self {
        self.term = term;
        self
    }

    pub fn with_sub_account(mut self, sub_account: Option<AccountId>) -> Self {
        self.sub_account = sub_account;
        self
    }

    /// Builds a request from a loose parameter map
    ///
    /// Every key with a truthy value is treated as a requested report name;
    /// non-catalog keys such as `created_by_sis` fall out in [`Self::enabled`].
    /// Keys are sorted so the raw request is deterministic.
    pub fn from_parameters(params: &HashMap<String, String>, format: ReportFormat) -> Self {
        let mut reports: Vec<String> = params
            .iter()
            .filter(|(_, v)| value_to_boolean(v))
            .map(|(k, _)| k.clone())
            .collect();
        reports.sort();

        let flag = |key: &str| params.get(key).is_some_and(|v| value_to_boolean(v));

        Self {
            reports,
            format,
            created_by_sis: flag("created_by_sis"),
            include_deleted: flag("include_deleted"),
            term: params
                .get("enrollment_term_id")
                .and_then(|v| TermId::from_str(v).ok()),
            sub_account: None,
        }
    }

    /// Enabled report kinds, in catalog order
    pub fn enabled(&self) -> Vec<ReportKind> {
        ReportKind::enabled(&self.reports)
    }
}

/// Interprets a loosely typed parameter value as a boolean
pub fn value_to_boolean(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "t" | "on" | "yes" | "y"
    )
}
