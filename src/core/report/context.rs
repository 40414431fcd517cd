//! Per-export report context: format, flags and the resolved scope

use crate::domain::{
    AccountId, AccountRecord, ReportFormat, TermRecord, UnresolvedLoginPolicy,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// How long a soft-deleted course stays visible to `include_deleted` exports
/// even without an external id
pub const RECENTLY_DELETED_DAYS: i64 = 120;

/// The organisational scope of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub root: AccountRecord,
    /// `None` when the whole root is exported
    pub sub_account: Option<AccountRecord>,
    pub term: Option<TermRecord>,
    /// Accounts the root trusts for login resolution, in preference order
    pub trusted_accounts: Vec<AccountId>,
}

impl Scope {
    pub fn root_only(root: AccountRecord) -> Self {
        Self {
            root,
            sub_account: None,
            term: None,
            trusted_accounts: Vec::new(),
        }
    }

    /// Whether the root participates in a federation of trusted accounts
    pub fn is_federated(&self) -> bool {
        !self.trusted_accounts.is_empty()
    }
}

/// Localised provisioning header names, keyed by canonical name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderLabels(BTreeMap<String, String>);

impl HeaderLabels {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self(labels)
    }

    pub fn label<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.0.get(canonical).map(String::as_str).unwrap_or(canonical)
    }

    pub fn apply(&self, headers: &[&str]) -> Vec<String> {
        headers.iter().map(|h| self.label(h).to_string()).collect()
    }
}

/// Everything a report needs besides the source itself
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub format: ReportFormat,
    pub created_by_sis: bool,
    pub include_deleted: bool,
    pub scope: Scope,
    /// Reference time for the recently-deleted window
    pub now: DateTime<Utc>,
    pub unresolved_logins: UnresolvedLoginPolicy,
    pub labels: HeaderLabels,
}

impl ReportContext {
    pub fn new(format: ReportFormat, scope: Scope) -> Self {
        Self {
            format,
            created_by_sis: false,
            include_deleted: false,
            scope,
            now: Utc::now(),
            unresolved_logins: UnresolvedLoginPolicy::default(),
            labels: HeaderLabels::default(),
        }
    }

    pub fn strict(&self) -> bool {
        self.format.is_strict()
    }

    pub fn root(&self) -> AccountId {
        self.scope.root.id
    }

    /// The account reports are restricted to: the sub-account if set, else the root
    pub fn effective_account(&self) -> AccountId {
        self.scope
            .sub_account
            .as_ref()
            .map(|a| a.id)
            .unwrap_or(self.scope.root.id)
    }

    /// Soft-deleted courses updated after this instant are still exported
    pub fn deleted_cutoff(&self) -> DateTime<Utc> {
        self.now - Duration::days(RECENTLY_DELETED_DAYS)
    }

    /// Header row for a report, strict headers verbatim, provisioning headers
    /// through the label overrides
    pub fn headers(&self, strict: &[&str], provisioning: &[&str]) -> Vec<String> {
        if self.strict() {
            strict.iter().map(|h| (*h).to_string()).collect()
        } else {
            self.labels.apply(provisioning)
        }
    }
}
