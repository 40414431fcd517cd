//! Groups report

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::scope;
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const STRICT_HEADERS: &[&str] = &["group_id", "account_id", "name", "status"];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_group_id",
    "group_id",
    "canvas_account_id",
    "account_id",
    "name",
    "status",
    "created_by_sis",
    "context_id",
    "context_type",
    "group_category_id",
    "max_membership",
];

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::Groups.as_str(), "groups g", "g.id")
        .join("JOIN accounts ga ON ga.id = g.account_id")
        .columns(&[
            ("g.sis_source_id", "sis_source_id"),
            ("g.account_id", "account_id"),
            ("ga.sis_source_id", "account_sis_id"),
            ("g.name", "name"),
            ("g.workflow_state", "workflow_state"),
            ("g.sis_batch_id", "sis_batch_id"),
            ("g.context_id", "context_id"),
            ("g.context_type", "context_type"),
            ("g.group_category_id", "group_category_id"),
            ("g.max_membership", "max_membership"),
        ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("g.root_account_id = {root}"));
    scope::strict_ids(&mut q, ctx, &["g.sis_source_id"]);
    scope::created_by_sis(&mut q, ctx, "g.sis_batch_id");
    scope::deleted_policy(&mut q, ctx, "g.workflow_state", "g.sis_source_id");
    scope::group_context_scope(&mut q, ctx, "g");
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
        row.push(r.raw("account_id")?);
    }
    row.push(r.raw("account_sis_id")?);
    row.push(r.raw("name")?);
    row.push(r.raw("workflow_state")?);
    if !strict {
        row.push(r.is_present("sis_batch_id")?.into());
        row.push(r.raw("context_id")?);
        row.push(r.raw("context_type")?);
        row.push(r.raw("group_category_id")?);
        row.push(r.raw("max_membership")?);
    }
    Ok(row)
}
