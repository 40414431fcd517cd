//! Observer links between users, by their logins in the root account

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::scope;
use crate::domain::{Cell, ReportKind, Result, Row, SourceRow};

pub const STRICT_HEADERS: &[&str] = &["observer_id", "student_id", "status"];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_observer_id",
    "observer_id",
    "canvas_student_id",
    "student_id",
    "status",
    "created_by_sis",
];

fn login_join(alias: &str, user_column: &str, root: &str) -> String {
    format!(
        "JOIN LATERAL (SELECT p.sis_user_id, p.workflow_state FROM pseudonyms p \
         WHERE p.user_id = {user_column} AND p.account_id = {root} \
         ORDER BY p.workflow_state = 'deleted', p.position, p.id LIMIT 1) {alias} ON TRUE"
    )
}

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::UserObservers.as_str(), "user_observers uo", "uo.id")
        .columns(&[
            ("uo.observer_id", "observer_id"),
            ("op.sis_user_id", "observer_sis_id"),
            ("uo.user_id", "student_id"),
            ("sp.sis_user_id", "student_sis_id"),
            ("uo.workflow_state", "workflow_state"),
            ("uo.sis_batch_id", "sis_batch_id"),
        ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.add_join(login_join("sp", "uo.user_id", &root));
    q.add_join(login_join("op", "uo.observer_id", &root));

    scope::strict_ids(&mut q, ctx, &["op.sis_user_id", "sp.sis_user_id"]);
    scope::created_by_sis(&mut q, ctx, "uo.sis_batch_id");

    if ctx.include_deleted {
        q.filter("uo.workflow_state <> 'deleted' OR uo.sis_batch_id IS NOT NULL");
    } else {
        q.filter("uo.workflow_state <> 'deleted' AND sp.workflow_state <> 'deleted'");
    }
    q
}

pub fn row(ctx: &ReportContext, r: &SourceRow) -> Result<Row> {
    let strict = ctx.strict();
    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len());
    if !strict {
        row.push(Cell::Int(r.id("observer_id")?));
    }
    row.push(r.raw("observer_sis_id")?);
    if !strict {
        row.push(Cell::Int(r.id("student_id")?));
    }
    row.push(r.raw("student_sis_id")?);
    row.push(r.raw("workflow_state")?);
    if !strict {
        row.push(r.is_present("sis_batch_id")?.into());
    }
    Ok(row)
}
