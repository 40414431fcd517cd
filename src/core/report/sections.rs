//! Sections report
//!
//! A cross-listed section is reported against its original course (and that
//! course's account) until it is de-cross-listed.

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::scope;
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const STRICT_HEADERS: &[&str] = &[
    "section_id",
    "course_id",
    "integration_id",
    "name",
    "status",
    "start_date",
    "end_date",
];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_section_id",
    "section_id",
    "canvas_course_id",
    "course_id",
    "integration_id",
    "name",
    "status",
    "start_date",
    "end_date",
    "canvas_account_id",
    "account_id",
    "created_by_sis",
];

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::Sections.as_str(), "course_sections s", "s.id")
        .join("JOIN courses rc ON rc.id = s.course_id")
        .join("JOIN accounts ra ON ra.id = rc.account_id")
        .join("LEFT JOIN courses nxc ON nxc.id = s.nonxlist_course_id")
        .join("LEFT JOIN accounts nxa ON nxa.id = nxc.account_id")
        .columns(&[
            ("s.sis_source_id", "sis_source_id"),
            ("s.course_id", "course_id"),
            ("rc.sis_source_id", "course_sis_id"),
            ("s.nonxlist_course_id", "nonxlist_course_id"),
            ("nxc.sis_source_id", "nxc_sis_id"),
            ("s.integration_id", "integration_id"),
            ("s.name", "name"),
            ("s.workflow_state", "workflow_state"),
            ("s.start_at", "start_at"),
            ("s.end_at", "end_at"),
            ("s.restrict_enrollments_to_section_dates", "restrict_dates"),
            ("ra.id", "r_account_id"),
            ("ra.sis_source_id", "r_account_sis_id"),
            ("nxc.account_id", "nx_account_id"),
            ("nxa.sis_source_id", "nx_account_sis_id"),
            ("s.sis_batch_id", "sis_batch_id"),
        ]);

    let reported_course = scope::reported_course_sis("s", "rc", "nxc");

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("s.root_account_id = {root}"));

    if ctx.include_deleted {
        q.filter(format!(
            "s.workflow_state <> 'deleted' OR (s.sis_source_id IS NOT NULL AND {reported_course} IS NOT NULL)"
        ));
    } else {
        q.filter(
            "s.workflow_state <> 'deleted' \
             AND (nxc.workflow_state <> 'deleted' OR rc.workflow_state <> 'deleted')",
        );
    }

    scope::strict_ids(&mut q, ctx, &["s.sis_source_id", reported_course.as_str()]);
    scope::created_by_sis(&mut q, ctx, "s.sis_batch_id");
    scope::course_scope(&mut q, ctx, "rc");
    q
}

pub fn row(ctx: &ReportContext, r: &SourceRow) -> Result<Row> {
    let strict = ctx.strict();
    let cross_listed = r.is_present("nonxlist_course_id")?;
    let (course_id, course_sis, account_id, account_sis) = if cross_listed {
        ("nonxlist_course_id", "nxc_sis_id", "nx_account_id", "nx_account_sis_id")
    } else {
        ("course_id", "course_sis_id", "r_account_id", "r_account_sis_id")
    };

    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len());
    if !strict {
        row.push(Cell::Int(r.cursor()?));
    }
    row.push(r.raw("sis_source_id")?);
    if !strict {
        row.push(r.raw(course_id)?);
    }
    row.push(r.raw(course_sis)?);
    row.push(r.raw("integration_id")?);
    row.push(r.raw("name")?);
    row.push(r.raw("workflow_state")?);
    if r.flag("restrict_dates")? {
        row.push(r.time("start_at")?.into());
        row.push(r.time("end_at")?.into());
    } else {
        row.push(Cell::Null);
        row.push(Cell::Null);
    }
    if !strict {
        row.push(r.raw(account_id)?);
        row.push(r.raw(account_sis)?);
        row.push(r.is_present("sis_batch_id")?.into());
    }
    Ok(row)
}
