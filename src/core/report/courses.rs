//! Courses report

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::scope;
use crate::domain::status::{provisioning_course_status, sis_course_status};
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const STRICT_HEADERS: &[&str] = &[
    "course_id",
    "integration_id",
    "short_name",
    "long_name",
    "account_id",
    "term_id",
    "status",
    "start_date",
    "end_date",
];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_course_id",
    "course_id",
    "integration_id",
    "short_name",
    "long_name",
    "canvas_account_id",
    "account_id",
    "canvas_term_id",
    "term_id",
    "status",
    "start_date",
    "end_date",
    "created_by_sis",
];

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::Courses.as_str(), "courses c", "c.id")
        .join("LEFT JOIN accounts ca ON ca.id = c.account_id")
        .join("LEFT JOIN enrollment_terms ct ON ct.id = c.enrollment_term_id")
        .columns(&[
            ("c.sis_source_id", "sis_source_id"),
            ("c.integration_id", "integration_id"),
            ("c.course_code", "course_code"),
            ("c.name", "name"),
            ("c.account_id", "account_id"),
            ("ca.sis_source_id", "account_sis_id"),
            ("c.enrollment_term_id", "term_id"),
            ("ct.sis_source_id", "term_sis_id"),
            ("c.workflow_state", "workflow_state"),
            ("c.start_at", "start_at"),
            ("c.conclude_at", "conclude_at"),
            ("c.restrict_enrollments_to_course_dates", "restrict_dates"),
            ("c.sis_batch_id", "sis_batch_id"),
        ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("c.root_account_id = {root}"));
    scope::strict_ids(&mut q, ctx, &["c.sis_source_id"]);
    scope::created_by_sis(&mut q, ctx, "c.sis_batch_id");

    if ctx.include_deleted {
        let cutoff = q.bind(SqlParam::Time(ctx.deleted_cutoff()));
        q.filter(format!(
            "(c.workflow_state = 'deleted' AND c.updated_at > {cutoff}) \
             OR c.workflow_state <> 'deleted' OR c.sis_source_id IS NOT NULL"
        ));
    } else {
        q.filter("c.workflow_state NOT IN ('deleted', 'completed')");
    }

    scope::course_scope(&mut q, ctx, "c");
    q
}

pub fn row(ctx: &ReportContext, r: &SourceRow) -> Result<Row> {
    let strict = ctx.strict();
    let state = r.text("workflow_state")?.unwrap_or_default();
    let restricted = r.flag("restrict_dates")?;

    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len());
    if !strict {
        row.push(Cell::Int(r.cursor()?));
    }
    row.push(r.raw("sis_source_id")?);
    row.push(r.raw("integration_id")?);
    row.push(r.raw("course_code")?);
    row.push(r.raw("name")?);
    if !strict {
        row.push(r.raw("account_id")?);
    }
    row.push(r.raw("account_sis_id")?);
    if !strict {
        row.push(r.raw("term_id")?);
    }
    row.push(r.raw("term_sis_id")?);
    if strict {
        row.push(sis_course_status(state).into());
    } else {
        row.push(provisioning_course_status(state).into());
    }
    if restricted {
        row.push(r.time("start_at")?.into());
        row.push(r.time("conclude_at")?.into());
    } else {
        row.push(Cell::Null);
        row.push(Cell::Null);
    }
    if !strict {
        row.push(r.is_present("sis_batch_id")?.into());
    }
    Ok(row)
}
