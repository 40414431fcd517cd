//! Report source abstraction
//!
//! The exporter reads everything through [`ReportSource`]: paged report
//! queries plus the handful of keyed lookups that are batched per page
//! (contact emails, cross-account logins) or done once per export (scope
//! records, trust list).

use crate::core::report::query::Select;
use crate::domain::{AccountId, AccountRecord, LoginRecord, Result, SourceRow, TermId, TermRecord};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;

/// Read-only relational source the reports are built from
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Downcast to Any for type-specific operations
    fn as_any(&self) -> &dyn Any;

    /// Test the source connection
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached.
    async fn test_connection(&self) -> Result<()>;

    /// Fetch one page of `query`: rows whose cursor is greater than `after`,
    /// ascending, at most `limit`
    ///
    /// # Errors
    ///
    /// Query failures are returned unchanged; they end the report.
    async fn fetch_page(
        &self,
        query: &Select,
        after: Option<i64>,
        limit: usize,
    ) -> Result<Vec<SourceRow>>;

    /// Look up an account by id
    async fn account(&self, id: AccountId) -> Result<Option<AccountRecord>>;

    /// Look up a term by id
    async fn term(&self, id: TermId) -> Result<Option<TermRecord>>;

    /// Accounts `root` trusts for login resolution, in preference order
    ///
    /// Empty when the root is not part of a federation.
    async fn trusted_account_ids(&self, root: AccountId) -> Result<Vec<AccountId>>;

    /// First unretired email address of each user, by channel position
    ///
    /// Users without one are absent from the map.
    async fn primary_emails(&self, user_ids: &[i64]) -> Result<HashMap<i64, String>>;

    /// Active logins of the given users that belong to any of `accounts`
    async fn active_logins(
        &self,
        user_ids: &[i64],
        accounts: &[AccountId],
    ) -> Result<Vec<LoginRecord>>;
}
