//! Group membership report

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::scope;
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const STRICT_HEADERS: &[&str] = &["group_id", "user_id", "status"];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_group_id",
    "group_id",
    "canvas_user_id",
    "user_id",
    "status",
    "created_by_sis",
];

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(
        ReportKind::GroupMembership.as_str(),
        "group_memberships gm",
        "gm.id",
    )
    .join("JOIN groups g ON g.id = gm.group_id")
    .join(
        "JOIN LATERAL (SELECT p.sis_user_id FROM pseudonyms p \
         WHERE p.user_id = gm.user_id AND p.account_id = g.root_account_id \
         ORDER BY p.workflow_state = 'deleted', p.position, p.id LIMIT 1) pseudo ON TRUE",
    )
    .columns(&[
        ("gm.group_id", "group_id"),
        ("g.sis_source_id", "group_sis_id"),
        ("gm.user_id", "user_id"),
        ("pseudo.sis_user_id", "user_sis_id"),
        ("gm.workflow_state", "workflow_state"),
        ("gm.sis_batch_id", "sis_batch_id"),
    ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("g.root_account_id = {root}"));
    scope::exclude_test_students(&mut q, "gm.user_id");
    scope::strict_ids(&mut q, ctx, &["g.sis_source_id", "pseudo.sis_user_id"]);
    scope::created_by_sis(&mut q, ctx, "gm.sis_batch_id");

    if ctx.include_deleted {
        q.filter(
            "(g.workflow_state <> 'deleted' AND gm.workflow_state <> 'deleted') \
             OR (pseudo.sis_user_id IS NOT NULL AND gm.sis_batch_id IS NOT NULL)",
        );
    } else {
        q.filter("g.workflow_state <> 'deleted' AND gm.workflow_state <> 'deleted'");
    }

    scope::group_context_scope(&mut q, ctx, "g");
    q
}

pub fn row(ctx: &ReportContext, r: &SourceRow) -> Result<Row> {
    let strict = ctx.strict();
    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len());
    if !strict {
        row.push(Cell::Int(r.id("group_id")?));
    }
    row.push(r.raw("group_sis_id")?);
    if !strict {
        row.push(Cell::Int(r.id("user_id")?));
    }
    row.push(r.raw("user_sis_id")?);
    row.push(r.raw("workflow_state")?);
    if !strict {
        row.push(r.is_present("sis_batch_id")?.into());
    }
    Ok(row)
}
