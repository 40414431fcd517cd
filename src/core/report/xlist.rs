//! Cross-listing report: sections currently living outside their original course

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::scope;
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const STRICT_HEADERS: &[&str] = &["xlist_course_id", "section_id", "status"];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_xlist_course_id",
    "xlist_course_id",
    "canvas_section_id",
    "section_id",
    "status",
    "canvas_nonxlist_course_id",
    "nonxlist_course_id",
];

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::Xlist.as_str(), "course_sections s", "s.id")
        .join("JOIN courses c ON c.id = s.course_id")
        .join("JOIN courses nxc ON nxc.id = s.nonxlist_course_id")
        .columns(&[
            ("s.course_id", "course_id"),
            ("c.sis_source_id", "course_sis_id"),
            ("s.sis_source_id", "sis_source_id"),
            ("s.workflow_state", "workflow_state"),
            ("s.nonxlist_course_id", "nonxlist_course_id"),
            ("nxc.sis_source_id", "nxc_sis_id"),
        ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("s.root_account_id = {root}"));
    q.filter("s.nonxlist_course_id IS NOT NULL");
    scope::created_by_sis(&mut q, ctx, "s.sis_batch_id");
    scope::strict_ids(&mut q, ctx, &["c.sis_source_id", "s.sis_source_id"]);

    if ctx.include_deleted {
        q.filter(
            "(c.workflow_state <> 'deleted' AND s.workflow_state <> 'deleted') \
             OR (c.sis_source_id IS NOT NULL AND s.sis_source_id IS NOT NULL)",
        );
    } else {
        q.filter(
            "c.workflow_state NOT IN ('deleted', 'completed') AND s.workflow_state <> 'deleted'",
        );
    }

    scope::course_scope(&mut q, ctx, "c");
    q
}

pub fn row(ctx: &ReportContext, r: &SourceRow) -> Result<Row> {
    let strict = ctx.strict();
    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len());
    if !strict {
        row.push(r.raw("course_id")?);
    }
    row.push(r.raw("course_sis_id")?);
    if !strict {
        row.push(Cell::Int(r.cursor()?));
    }
    row.push(r.raw("sis_source_id")?);
    row.push(r.raw("workflow_state")?);
    if !strict {
        row.push(r.raw("nonxlist_course_id")?);
        row.push(r.raw("nxc_sis_id")?);
    }
    Ok(row)
}
