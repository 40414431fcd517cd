//! Shared fixtures for integration tests
//!
//! [`FixtureSource`] is an in-memory `ReportSource`. Rows are registered per
//! report name as they would come back from the already-filtered query; the
//! source applies keyset pagination and records every call.

#![allow(dead_code)]

use async_trait::async_trait;
use roster::adapters::database::ReportSource;
use roster::core::report::Select;
use roster::domain::{
    AccountId, AccountRecord, LoginRecord, Result, SourceError, SourceRow, TermId, TermRecord,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FixtureSource {
    pub accounts: HashMap<i64, AccountRecord>,
    pub terms: HashMap<i64, TermRecord>,
    pub trusted: Vec<AccountId>,
    pub emails: HashMap<i64, String>,
    pub logins: Vec<LoginRecord>,
    pub rows: HashMap<&'static str, Vec<SourceRow>>,
    pub fail_query: Option<&'static str>,
    /// Pages served before `fail_query` starts failing
    pub fail_after_pages: usize,

    pub page_calls: AtomicUsize,
    pub email_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub email_batches: Mutex<Vec<Vec<i64>>>,
    pub queries: Mutex<Vec<String>>,
}

pub fn account(id: i64, root: Option<i64>, domain: Option<&str>) -> AccountRecord {
    AccountRecord {
        id: AccountId::new(id).unwrap(),
        root_account_id: root.map(|r| AccountId::new(r).unwrap()),
        parent_account_id: root.map(|r| AccountId::new(r).unwrap()),
        name: format!("Account {id}"),
        domain: domain.map(str::to_string),
    }
}

pub fn acct(id: i64) -> AccountId {
    AccountId::new(id).unwrap()
}

pub fn login(id: i64, user_id: i64, account_id: i64, sis: &str, domain: &str) -> LoginRecord {
    LoginRecord {
        id,
        user_id,
        account_id: AccountId::new(account_id).unwrap(),
        unique_id: format!("login{id}"),
        sis_user_id: Some(sis.to_string()),
        position: Some(1),
        account_domain: Some(domain.to_string()),
    }
}

impl FixtureSource {
    /// Root account 1 (`lms.example.edu`) with sub-account 5 and term 14
    pub fn new() -> Self {
        let mut source = Self::default();
        source
            .accounts
            .insert(1, account(1, None, Some("lms.example.edu")));
        source.accounts.insert(5, account(5, Some(1), None));
        source.accounts.insert(2, account(2, None, Some("partner.example.edu")));
        source.terms.insert(
            14,
            TermRecord {
                id: TermId::new(14).unwrap(),
                root_account_id: AccountId::new(1).unwrap(),
                name: "Fall 2024".to_string(),
            },
        );
        source
    }

    pub fn with_rows(mut self, report: &'static str, rows: Vec<SourceRow>) -> Self {
        self.rows.insert(report, rows);
        self
    }

    pub fn into_arc(self) -> Arc<dyn ReportSource + Send + Sync> {
        Arc::new(self)
    }

    /// The fixture plus the trait object handed to the coordinator, so tests
    /// can inspect the counters afterwards
    pub fn shared(self) -> (Arc<Self>, Arc<dyn ReportSource + Send + Sync>) {
        let fixture = Arc::new(self);
        let source: Arc<dyn ReportSource + Send + Sync> = fixture.clone();
        (fixture, source)
    }

    pub fn pages(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportSource for FixtureSource {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch_page(
        &self,
        query: &Select,
        after: Option<i64>,
        limit: usize,
    ) -> Result<Vec<SourceRow>> {
        let served = self.page_calls.fetch_add(1, Ordering::SeqCst);
        let (sql, _) = query.page(after, limit);
        self.queries.lock().unwrap().push(sql);

        if self.fail_query == Some(query.name()) && served >= self.fail_after_pages {
            return Err(SourceError::QueryFailed(format!("{} exploded", query.name())).into());
        }

        let mut rows: Vec<SourceRow> = self
            .rows
            .get(query.name())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|r| after.map_or(true, |a| r.cursor().unwrap() > a))
            .collect();
        rows.sort_by_key(|r| r.cursor().unwrap());
        rows.truncate(limit);
        Ok(rows)
    }

    async fn account(&self, id: AccountId) -> Result<Option<AccountRecord>> {
        Ok(self.accounts.get(&id.get()).cloned())
    }

    async fn term(&self, id: TermId) -> Result<Option<TermRecord>> {
        Ok(self.terms.get(&id.get()).cloned())
    }

    async fn trusted_account_ids(&self, _root: AccountId) -> Result<Vec<AccountId>> {
        Ok(self.trusted.clone())
    }

    async fn primary_emails(&self, user_ids: &[i64]) -> Result<HashMap<i64, String>> {
        self.email_calls.fetch_add(1, Ordering::SeqCst);
        self.email_batches.lock().unwrap().push(user_ids.to_vec());
        Ok(user_ids
            .iter()
            .filter_map(|id| self.emails.get(id).map(|e| (*id, e.clone())))
            .collect())
    }

    async fn active_logins(
        &self,
        user_ids: &[i64],
        accounts: &[AccountId],
    ) -> Result<Vec<LoginRecord>> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .logins
            .iter()
            .filter(|l| user_ids.contains(&l.user_id) && accounts.contains(&l.account_id))
            .cloned()
            .collect())
    }
}

pub fn user_row(cursor: i64, user_id: i64, sis: &str, sortable: &str) -> SourceRow {
    SourceRow::new()
        .with("cursor_id", cursor)
        .with("user_id", user_id)
        .with("sis_user_id", sis)
        .with("integration_id", None::<String>)
        .with("authentication_provider_id", None::<i64>)
        .with("unique_id", format!("login{user_id}"))
        .with("workflow_state", "active")
        .with("sis_batch_id", 1)
        .with("name", sortable)
        .with("sortable_name", sortable)
        .with("short_name", None::<String>)
}

pub fn term_row(cursor: i64, sis: &str, name: &str) -> SourceRow {
    SourceRow::new()
        .with("cursor_id", cursor)
        .with("sis_source_id", sis)
        .with("name", name)
        .with("workflow_state", "active")
        .with("start_at", None::<String>)
        .with("end_at", None::<String>)
        .with("sis_batch_id", 1)
}

/// An enrollment of `user_id`; `local_sis` is the user's login in the root
/// (`None` when the user has no login there)
pub fn enrollment_row(cursor: i64, user_id: i64, local_sis: Option<&str>) -> SourceRow {
    SourceRow::new()
        .with("cursor_id", cursor)
        .with("course_id", 40)
        .with("course_sis_id", "BIO101")
        .with("nxc_id", None::<i64>)
        .with("nxc_sis_id", None::<String>)
        .with("user_id", user_id)
        .with("unique_id", local_sis.map(|s| format!("login-{s}")))
        .with("pseudonym_sis_id", local_sis)
        .with("pseudo_state", local_sis.map(|_| "active"))
        .with("enrollment_type", "StudentEnrollment")
        .with("role_name", "StudentEnrollment")
        .with("role_id", 3)
        .with("course_section_id", 60)
        .with("section_sis_id", "BIO101-01")
        .with("section_state", "active")
        .with("course_state", "available")
        .with("workflow_state", "active")
        .with("associated_user_id", None::<i64>)
        .with("ob_unique_id", None::<String>)
        .with("ob_sis_id", None::<String>)
        .with("sis_batch_id", 4)
        .with("limit_privileges", false)
}
