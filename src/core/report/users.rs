//! Users report: one row per login in the root account

use crate::adapters::database::ReportSource;
use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::{scope, BatchResult};
use crate::domain::{name_parts, Cell, ReportKind, Result, Row, SourceRow};
use std::collections::HashMap;

pub const STRICT_HEADERS: &[&str] = &[
    "user_id",
    "integration_id",
    "authentication_provider_id",
    "login_id",
    "password",
    "first_name",
    "last_name",
    "full_name",
    "sortable_name",
    "short_name",
    "email",
    "status",
];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_user_id",
    "user_id",
    "integration_id",
    "authentication_provider_id",
    "login_id",
    "first_name",
    "last_name",
    "full_name",
    "sortable_name",
    "short_name",
    "email",
    "status",
    "created_by_sis",
];

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::Users.as_str(), "pseudonyms p", "p.id")
        .join("JOIN users u ON u.id = p.user_id")
        .columns(&[
            ("p.user_id", "user_id"),
            ("p.sis_user_id", "sis_user_id"),
            ("p.integration_id", "integration_id"),
            ("p.authentication_provider_id", "authentication_provider_id"),
            ("p.unique_id", "unique_id"),
            ("p.workflow_state", "workflow_state"),
            ("p.sis_batch_id", "sis_batch_id"),
            ("u.name", "name"),
            ("u.sortable_name", "sortable_name"),
            ("u.short_name", "short_name"),
        ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("p.account_id = {root}"));
    scope::exclude_test_students(&mut q, "p.user_id");
    scope::strict_ids(&mut q, ctx, &["p.sis_user_id"]);
    scope::created_by_sis(&mut q, ctx, "p.sis_batch_id");
    scope::deleted_policy(&mut q, ctx, "p.workflow_state", "p.sis_user_id");
    scope::user_scope(&mut q, ctx, "p.user_id");
    q
}

/// Resolves the batch's emails in one lookup, then builds the rows
pub async fn assemble(
    ctx: &ReportContext,
    source: &dyn ReportSource,
    batch: &[SourceRow],
) -> Result<BatchResult> {
    let mut user_ids = batch
        .iter()
        .map(|r| r.id("user_id"))
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    user_ids.sort_unstable();
    user_ids.dedup();

    let emails = if user_ids.is_empty() {
        HashMap::new()
    } else {
        source.primary_emails(&user_ids).await?
    };

    batch
        .iter()
        .map(|r| row(ctx, r, &emails))
        .collect::<Result<Vec<Row>>>()
        .map(BatchResult::from_rows)
}

pub fn row(ctx: &ReportContext, r: &SourceRow, emails: &HashMap<i64, String>) -> Result<Row> {
    let strict = ctx.strict();
    let user_id = r.id("user_id")?;
    let names = name_parts(r.text("sortable_name")?.unwrap_or_default());

    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len());
    if !strict {
        row.push(Cell::Int(user_id));
    }
    row.push(r.raw("sis_user_id")?);
    row.push(r.raw("integration_id")?);
    row.push(r.raw("authentication_provider_id")?);
    row.push(r.raw("unique_id")?);
    if strict {
        // password is never exported
        row.push(Cell::Null);
    }
    row.push(names.given.into());
    row.push(names.surname.into());
    row.push(r.raw("name")?);
    row.push(r.raw("sortable_name")?);
    row.push(r.raw("short_name")?);
    row.push(emails.get(&user_id).cloned().into());
    row.push(r.raw("workflow_state")?);
    if !strict {
        row.push(r.is_present("sis_batch_id")?.into());
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::test_support::ctx;
    use crate::domain::{AccountId, AccountRecord, ReportFormat};

    fn source_row() -> SourceRow {
        SourceRow::new()
            .with("cursor_id", 10)
            .with("user_id", 7)
            .with("sis_user_id", "U7")
            .with("integration_id", None::<String>)
            .with("authentication_provider_id", None::<i64>)
            .with("unique_id", "jdoe")
            .with("workflow_state", "active")
            .with("sis_batch_id", 3)
            .with("name", "John Doe")
            .with("sortable_name", "Doe, John")
            .with("short_name", "John")
    }

    #[test]
    fn test_strict_row_matches_header() {
        let ctx = ctx(ReportFormat::Sis);
        let emails = HashMap::from([(7, "jdoe@example.edu".to_string())]);
        let row = row(&ctx, &source_row(), &emails).unwrap();

        assert_eq!(row.len(), STRICT_HEADERS.len());
        assert_eq!(row[0], Cell::from("U7"));
        assert_eq!(row[4], Cell::Null);
        assert_eq!(row[5], Cell::from("John"));
        assert_eq!(row[6], Cell::from("Doe"));
        assert_eq!(row[10], Cell::from("jdoe@example.edu"));
    }

    #[test]
    fn test_provisioning_row_has_internal_id() {
        let ctx = ctx(ReportFormat::Provisioning);
        let row = row(&ctx, &source_row(), &HashMap::new()).unwrap();

        assert_eq!(row.len(), PROVISIONING_HEADERS.len());
        assert_eq!(row[0], Cell::Int(7));
        assert_eq!(row[10], Cell::Null);
        assert_eq!(row[12], Cell::Bool(true));
    }

    #[test]
    fn test_query_filters() {
        let mut ctx = ctx(ReportFormat::Sis);
        ctx.created_by_sis = true;
        let q = query(&ctx);
        let conditions = q.conditions().join(" | ");

        assert!(conditions.contains("p.account_id = $1"));
        assert!(conditions.contains("StudentViewEnrollment"));
        assert!(conditions.contains("p.sis_user_id IS NOT NULL"));
        assert!(conditions.contains("p.sis_batch_id IS NOT NULL"));
        assert!(conditions.contains("p.workflow_state <> 'deleted'"));
    }

    #[test]
    fn test_sub_account_uses_user_associations() {
        let mut ctx = ctx(ReportFormat::Provisioning);
        ctx.scope.sub_account = Some(AccountRecord {
            id: AccountId::new(4).unwrap(),
            root_account_id: Some(AccountId::new(1).unwrap()),
            parent_account_id: Some(AccountId::new(1).unwrap()),
            name: "Sub".to_string(),
            domain: None,
        });
        let q = query(&ctx);
        assert!(q.render().contains("user_account_associations"));
        assert_eq!(q.params(), &[SqlParam::Int(1), SqlParam::Int(4)]);
    }
}
