//! Group categories report; provisioning format only

use crate::core::report::context::ReportContext;
use crate::core::report::query::Select;
use crate::core::report::scope;
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_group_category_id",
    "context_id",
    "context_type",
    "name",
    "role",
    "self_signup",
    "group_limit",
    "auto_leader",
];

/// Categories whose account or course lives under the effective account
pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(
        ReportKind::GroupCategories.as_str(),
        "group_categories cat",
        "cat.id",
    )
    .join("LEFT JOIN courses c ON cat.context_type = 'Course' AND c.id = cat.context_id")
    .join("LEFT JOIN accounts a ON cat.context_type = 'Account' AND a.id = cat.context_id")
    .columns(&[
        ("cat.context_id", "context_id"),
        ("cat.context_type", "context_type"),
        ("cat.name", "name"),
        ("cat.role", "role"),
        ("cat.self_signup", "self_signup"),
        ("cat.group_limit", "group_limit"),
        ("cat.auto_leader", "auto_leader"),
    ]);

    let account = ctx.effective_account();
    let accounts = scope::subtree_sql(&mut q, account);
    let courses = scope::subtree_sql(&mut q, account);
    q.filter(format!("a.id IN ({accounts}) OR c.account_id IN ({courses})"));

    scope::created_by_sis(&mut q, ctx, "cat.sis_batch_id");
    if !ctx.include_deleted {
        q.filter("cat.deleted_at IS NULL");
    }
    q
}

pub fn row(_ctx: &ReportContext, r: &SourceRow) -> Result<Row> {
    Ok(vec![
        Cell::Int(r.cursor()?),
        r.raw("context_id")?,
        r.raw("context_type")?,
        r.raw("name")?,
        r.raw("role")?,
        r.raw("self_signup")?,
        r.raw("group_limit")?,
        r.raw("auto_leader")?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::query::SqlParam;
    use crate::core::report::test_support::ctx;
    use crate::domain::ReportFormat;

    #[test]
    fn test_scoped_to_root_tree() {
        let q = query(&ctx(ReportFormat::Provisioning));
        assert_eq!(q.params(), &[SqlParam::Int(1), SqlParam::Int(1)]);
        assert!(q.conditions().contains(&"cat.deleted_at IS NULL".to_string()));
    }

    #[test]
    fn test_include_deleted_drops_deleted_filter() {
        let mut ctx = ctx(ReportFormat::Provisioning);
        ctx.include_deleted = true;
        let q = query(&ctx);
        assert!(!q.conditions().iter().any(|c| c.contains("deleted_at")));
    }

    #[test]
    fn test_row() {
        let r = SourceRow::new()
            .with("cursor_id", 12)
            .with("context_id", 40)
            .with("context_type", "Course")
            .with("name", "Project Groups")
            .with("role", None::<String>)
            .with("self_signup", "enabled")
            .with("group_limit", 4)
            .with("auto_leader", None::<String>);
        let row = row(&ctx(ReportFormat::Provisioning), &r).unwrap();
        assert_eq!(row.len(), PROVISIONING_HEADERS.len());
        assert_eq!(row[0], Cell::Int(12));
    }
}
