//! Terms report; root-wide, unaffected by sub-account or term scope

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::scope;
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const STRICT_HEADERS: &[&str] = &["term_id", "name", "status", "start_date", "end_date"];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_term_id",
    "term_id",
    "name",
    "status",
    "start_date",
    "end_date",
    "created_by_sis",
];

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::Terms.as_str(), "enrollment_terms t", "t.id").columns(&[
        ("t.sis_source_id", "sis_source_id"),
        ("t.name", "name"),
        ("t.workflow_state", "workflow_state"),
        ("t.start_at", "start_at"),
        ("t.end_at", "end_at"),
        ("t.sis_batch_id", "sis_batch_id"),
    ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("t.root_account_id = {root}"));
    scope::strict_ids(&mut q, ctx, &["t.sis_source_id"]);
    scope::created_by_sis(&mut q, ctx, "t.sis_batch_id");
    scope::deleted_policy(&mut q, ctx, "t.workflow_state", "t.sis_source_id");
    q
}

pub fn row(ctx: &ReportContext, r: &SourceRow) -> Result<Row> {
    let strict = ctx.strict();
    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len());
    if !strict {
        row.push(Cell::Int(r.cursor()?));
    }
    row.push(r.raw("sis_source_id")?);
    row.push(r.raw("name")?);
    row.push(r.raw("workflow_state")?);
    row.push(r.time("start_at")?.into());
    row.push(r.time("end_at")?.into());
    if !strict {
        row.push(r.is_present("sis_batch_id")?.into());
    }
    Ok(row)
}
