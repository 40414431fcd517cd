//! PostgreSQL adapter implementing the report source trait

use crate::adapters::database::traits::ReportSource;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    account_record, login_record, param_refs, source_row, term_record, to_boxed_params,
};
use crate::core::report::Select;
use crate::domain::{
    AccountId, AccountRecord, LoginRecord, Result, SourceError, SourceRow, TermId, TermRecord,
};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

const ACCOUNT_SQL: &str = "SELECT id, root_account_id, parent_account_id, name, domain \
     FROM accounts WHERE id = $1";

const TERM_SQL: &str = "SELECT id, root_account_id, name FROM enrollment_terms WHERE id = $1";

const TRUSTED_ACCOUNTS_SQL: &str = "SELECT trusted_account_id FROM account_trusts \
     WHERE account_id = $1 ORDER BY position, trusted_account_id";

const PRIMARY_EMAILS_SQL: &str = "SELECT DISTINCT ON (user_id) user_id, path \
     FROM communication_channels \
     WHERE user_id = ANY($1) AND path_type = 'email' AND workflow_state <> 'retired' \
     ORDER BY user_id, position, id";

const ACTIVE_LOGINS_SQL: &str = "SELECT p.id, p.user_id, p.account_id, p.unique_id, \
     p.sis_user_id, p.position::int8 AS position, a.domain \
     FROM pseudonyms p JOIN accounts a ON a.id = p.account_id \
     WHERE p.user_id = ANY($1) AND p.account_id = ANY($2) AND p.workflow_state = 'active'";

/// PostgreSQL implementation of [`ReportSource`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

#[async_trait]
impl ReportSource for PostgreSQLAdapter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn fetch_page(
        &self,
        query: &Select,
        after: Option<i64>,
        limit: usize,
    ) -> Result<Vec<SourceRow>> {
        let (sql, params) = query.page(after, limit);
        let boxed = to_boxed_params(&params);
        tracing::trace!(query = query.name(), sql = %sql, "Executing page query");

        let rows = self.client.query(&sql, &param_refs(&boxed)).await?;
        rows.iter()
            .map(|r| source_row(r).map_err(Into::into))
            .collect()
    }

    async fn account(&self, id: AccountId) -> Result<Option<AccountRecord>> {
        let rows = self.client.query(ACCOUNT_SQL, &[&id.get()]).await?;
        match rows.first() {
            Some(row) => Ok(Some(account_record(row)?)),
            None => Ok(None),
        }
    }

    async fn term(&self, id: TermId) -> Result<Option<TermRecord>> {
        let rows = self.client.query(TERM_SQL, &[&id.get()]).await?;
        match rows.first() {
            Some(row) => Ok(Some(term_record(row)?)),
            None => Ok(None),
        }
    }

    async fn trusted_account_ids(&self, root: AccountId) -> Result<Vec<AccountId>> {
        let rows = self.client.query(TRUSTED_ACCOUNTS_SQL, &[&root.get()]).await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get(0).map_err(|e| SourceError::UnexpectedType {
                column: "trusted_account_id".to_string(),
                found: e.to_string(),
            })?;
            ids.push(AccountId::new(id).map_err(|found| SourceError::UnexpectedType {
                column: "trusted_account_id".to_string(),
                found,
            })?);
        }
        Ok(ids)
    }

    async fn primary_emails(&self, user_ids: &[i64]) -> Result<HashMap<i64, String>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self.client.query(PRIMARY_EMAILS_SQL, &[&user_ids]).await?;
        let mut emails = HashMap::with_capacity(rows.len());
        for row in &rows {
            let user_id: i64 = row.try_get("user_id").map_err(|e| {
                SourceError::UnexpectedType {
                    column: "user_id".to_string(),
                    found: e.to_string(),
                }
            })?;
            let path: String = row.try_get("path").map_err(|e| SourceError::UnexpectedType {
                column: "path".to_string(),
                found: e.to_string(),
            })?;
            emails.insert(user_id, path);
        }
        Ok(emails)
    }

    async fn active_logins(
        &self,
        user_ids: &[i64],
        accounts: &[AccountId],
    ) -> Result<Vec<LoginRecord>> {
        if user_ids.is_empty() || accounts.is_empty() {
            return Ok(Vec::new());
        }
        let account_ids: Vec<i64> = accounts.iter().map(|a| a.get()).collect();
        let rows = self
            .client
            .query(ACTIVE_LOGINS_SQL, &[&user_ids, &account_ids])
            .await?;
        rows.iter()
            .map(|r| login_record(r).map_err(Into::into))
            .collect()
    }
}
