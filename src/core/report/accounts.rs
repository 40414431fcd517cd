//! Accounts report
//!
//! Sub-account scope here means the direct children of the sub-account, not
//! its whole tree.

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::scope;
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const STRICT_HEADERS: &[&str] = &["account_id", "parent_account_id", "name", "status"];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_account_id",
    "account_id",
    "canvas_parent_id",
    "parent_account_id",
    "name",
    "status",
    "created_by_sis",
];

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::Accounts.as_str(), "accounts a", "a.id")
        .join("JOIN accounts pa ON pa.id = a.parent_account_id")
        .columns(&[
            ("a.sis_source_id", "sis_source_id"),
            ("pa.id", "parent_id"),
            ("pa.sis_source_id", "parent_sis_source_id"),
            ("a.name", "name"),
            ("a.workflow_state", "workflow_state"),
            ("a.sis_batch_id", "sis_batch_id"),
        ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("a.root_account_id = {root}"));
    scope::strict_ids(&mut q, ctx, &["a.sis_source_id"]);
    scope::created_by_sis(&mut q, ctx, "a.sis_batch_id");
    scope::deleted_policy(&mut q, ctx, "a.workflow_state", "a.sis_source_id");

    if let Some(sub) = &ctx.scope.sub_account {
        let parent = q.bind(SqlParam::Int(sub.id.get()));
        q.filter(format!("a.parent_account_id = {parent}"));
    }
    q
}

pub fn row(ctx: &ReportContext, r: &SourceRow) -> Result<Row> {
    let strict = ctx.strict();
    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len());
    if !strict {
        row.push(Cell::Int(r.cursor()?));
    }
    row.push(r.raw("sis_source_id")?);
    if !strict {
        row.push(r.raw("parent_id")?);
    }
    row.push(r.raw("parent_sis_source_id")?);
    row.push(r.raw("name")?);
    row.push(r.raw("workflow_state")?);
    if !strict {
        row.push(r.is_present("sis_batch_id")?.into());
    }
    Ok(row)
}
