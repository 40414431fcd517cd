//! Enrollments report
//!
//! The user and observer external ids come from each user's login in the
//! enrollment's root account. When the root is federated and a user has no
//! such login, the batch resolves it across the trusted accounts in one
//! lookup (see [`crate::core::report::trust`]), and a trailing
//! `root_account` column names the domain the login came from.

use crate::adapters::database::ReportSource;
use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::core::report::trust::LoginIndex;
use crate::core::report::{scope, BatchResult};
use crate::domain::status::sis_role;
use crate::domain::{
    AccountId, Cell, EnrollmentState, ReportKind, Result, RosterError, Row, SourceRow,
    UnresolvedLoginPolicy,
};

pub const STRICT_HEADERS: &[&str] = &[
    "course_id",
    "user_id",
    "role",
    "role_id",
    "section_id",
    "status",
    "associated_user_id",
    "limit_section_privileges",
];

pub const PROVISIONING_HEADERS: &[&str] = &[
    "canvas_course_id",
    "course_id",
    "canvas_user_id",
    "user_id",
    "role",
    "role_id",
    "canvas_section_id",
    "section_id",
    "status",
    "canvas_associated_user_id",
    "associated_user_id",
    "created_by_sis",
    "base_role_type",
    "limit_section_privileges",
];

/// Trailing column present only for federated roots
pub const ROOT_ACCOUNT_HEADER: &str = "root_account";

pub fn headers(ctx: &ReportContext) -> Vec<String> {
    let mut headers = ctx.headers(STRICT_HEADERS, PROVISIONING_HEADERS);
    if ctx.scope.is_federated() {
        if ctx.strict() {
            headers.push(ROOT_ACCOUNT_HEADER.to_string());
        } else {
            headers.push(ctx.labels.label(ROOT_ACCOUNT_HEADER).to_string());
        }
    }
    headers
}

/// Lateral join picking one login of `user_column` in the enrollment's root,
/// preferring live logins
fn login_join(alias: &str, user_column: &str) -> String {
    format!(
        "LEFT JOIN LATERAL (SELECT p.unique_id, p.sis_user_id, p.workflow_state FROM pseudonyms p \
         WHERE p.user_id = {user_column} AND p.account_id = e.root_account_id \
         ORDER BY p.workflow_state = 'deleted', p.position, p.id LIMIT 1) {alias} ON TRUE"
    )
}

pub fn query(ctx: &ReportContext) -> Select {
    let mut q = Select::new(ReportKind::Enrollments.as_str(), "enrollments e", "e.id")
        .join("JOIN course_sections cs ON cs.id = e.course_section_id")
        .join("JOIN courses c ON c.id = cs.course_id")
        .join("LEFT JOIN courses nxc ON nxc.id = cs.nonxlist_course_id")
        .join("LEFT JOIN roles r ON r.id = e.role_id")
        .join(login_join("pseudo", "e.user_id"))
        .join(login_join("ob", "e.associated_user_id"))
        .columns(&[
            ("e.course_id", "course_id"),
            ("c.sis_source_id", "course_sis_id"),
            ("nxc.id", "nxc_id"),
            ("nxc.sis_source_id", "nxc_sis_id"),
            ("e.user_id", "user_id"),
            ("pseudo.unique_id", "unique_id"),
            ("pseudo.sis_user_id", "pseudonym_sis_id"),
            ("pseudo.workflow_state", "pseudo_state"),
            ("e.type", "enrollment_type"),
            ("r.name", "role_name"),
            ("e.role_id", "role_id"),
            ("e.course_section_id", "course_section_id"),
            ("cs.sis_source_id", "section_sis_id"),
            ("cs.workflow_state", "section_state"),
            ("c.workflow_state", "course_state"),
            ("e.workflow_state", "workflow_state"),
            ("e.associated_user_id", "associated_user_id"),
            ("ob.unique_id", "ob_unique_id"),
            ("ob.sis_user_id", "ob_sis_id"),
            ("e.sis_batch_id", "sis_batch_id"),
            ("e.limit_privileges_to_course_section", "limit_privileges"),
        ]);

    let root = q.bind(SqlParam::Int(ctx.root().get()));
    q.filter(format!("e.root_account_id = {root}"));
    q.filter("e.type <> 'StudentViewEnrollment'");

    if ctx.include_deleted {
        q.filter("e.workflow_state <> 'deleted' OR e.sis_batch_id IS NOT NULL");
    } else {
        q.filter("e.workflow_state NOT IN ('deleted', 'completed')");
    }

    if ctx.strict() {
        q.filter("e.workflow_state NOT IN ('rejected', 'invited', 'creation_pending')");
    }
    let reported_course = scope::reported_course_sis("cs", "c", "nxc");
    scope::strict_ids(&mut q, ctx, &["cs.sis_source_id", reported_course.as_str()]);
    if ctx.strict() {
        // Users without a root login are resolved per batch on federated roots
        if ctx.scope.is_federated() {
            q.filter("pseudo.sis_user_id IS NOT NULL OR pseudo.unique_id IS NULL");
        } else {
            q.filter("pseudo.sis_user_id IS NOT NULL");
        }
    }
    scope::created_by_sis(&mut q, ctx, "e.sis_batch_id");
    scope::course_scope(&mut q, ctx, "c");
    q
}

/// Users in the batch whose external id has to come from a trusted account
fn unresolved_users(batch: &[SourceRow]) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    for r in batch {
        if !r.is_present("unique_id")? {
            ids.push(r.id("user_id")?);
        }
        if let Some(observer) = r.opt_id("associated_user_id")? {
            if !r.is_present("ob_unique_id")? {
                ids.push(observer);
            }
        }
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

pub async fn assemble(
    ctx: &ReportContext,
    source: &dyn ReportSource,
    batch: &[SourceRow],
) -> Result<BatchResult> {
    let logins = if ctx.scope.is_federated() {
        let users = unresolved_users(batch)?;
        if users.is_empty() {
            LoginIndex::default()
        } else {
            let mut accounts: Vec<AccountId> = vec![ctx.root()];
            accounts.extend(ctx.scope.trusted_accounts.iter().copied());
            let found = source.active_logins(&users, &accounts).await?;
            LoginIndex::build(found, ctx.root(), &ctx.scope.trusted_accounts)
        }
    } else {
        LoginIndex::default()
    };

    let mut result = BatchResult::default();
    for r in batch {
        match row(ctx, r, &logins)? {
            Assembled::Row(row) => result.rows.push(row),
            Assembled::Filtered => {}
            Assembled::Unresolved => result.skipped += 1,
        }
    }
    Ok(result)
}

/// Outcome of assembling one enrollment
#[derive(Debug, PartialEq, Eq)]
pub enum Assembled {
    Row(Row),
    /// Left out by policy (deleted login)
    Filtered,
    /// User could not be resolved in any trusted account
    Unresolved,
}

pub fn row(ctx: &ReportContext, r: &SourceRow, logins: &LoginIndex) -> Result<Assembled> {
    if !ctx.include_deleted && r.text("pseudo_state")? == Some("deleted") {
        return Ok(Assembled::Filtered);
    }

    let strict = ctx.strict();
    let federated = ctx.scope.is_federated();
    let user_id = r.id("user_id")?;

    let mut domain = ctx.scope.root.domain.clone();
    let user_sis: Cell = if federated && !r.is_present("unique_id")? {
        match logins
            .get(user_id)
            .filter(|login| !strict || login.sis_user_id.is_some())
        {
            Some(login) => {
                domain = login.account_domain.clone().or(domain);
                login.sis_user_id.clone().into()
            }
            None => match (ctx.unresolved_logins, strict) {
                (UnresolvedLoginPolicy::Fail, _) => {
                    return Err(RosterError::Export(format!(
                        "No login with an external id for user {user_id} in any trusted account"
                    )));
                }
                (UnresolvedLoginPolicy::Skip, true) => {
                    tracing::debug!(user_id, "Skipping enrollment with unresolved login");
                    return Ok(Assembled::Unresolved);
                }
                (UnresolvedLoginPolicy::Skip, false) => Cell::Null,
            },
        }
    } else {
        r.raw("pseudonym_sis_id")?
    };

    let associated = r.opt_id("associated_user_id")?;
    let observer_sis: Cell = match associated {
        Some(observer) if federated && !r.is_present("ob_unique_id")? => logins
            .get(observer)
            .and_then(|l| l.sis_user_id.clone())
            .into(),
        _ => r.raw("ob_sis_id")?,
    };

    let (course_id, course_sis) = if r.is_present("nxc_id")? {
        (r.raw("nxc_id")?, r.raw("nxc_sis_id")?)
    } else {
        (r.raw("course_id")?, r.raw("course_sis_id")?)
    };

    let enrollment_type = r.text("enrollment_type")?.unwrap_or_default();
    let state = EnrollmentState::normalize(
        r.text("section_state")?.unwrap_or_default(),
        r.text("course_state")?.unwrap_or_default(),
        r.text("workflow_state")?.unwrap_or_default(),
    );

    let mut row = Vec::with_capacity(PROVISIONING_HEADERS.len() + 1);
    if !strict {
        row.push(course_id);
    }
    row.push(course_sis);
    if !strict {
        row.push(Cell::Int(user_id));
    }
    row.push(user_sis);
    row.push(sis_role(enrollment_type, r.text("role_name")?).into());
    row.push(r.raw("role_id")?);
    if !strict {
        row.push(r.raw("course_section_id")?);
    }
    row.push(r.raw("section_sis_id")?);
    row.push(state.map(EnrollmentState::as_str).into());
    if !strict {
        row.push(associated.into());
    }
    row.push(observer_sis);
    if !strict {
        row.push(r.is_present("sis_batch_id")?.into());
        row.push(enrollment_type.into());
    }
    row.push(r.flag("limit_privileges")?.into());
    if federated {
        row.push(domain.into());
    }
    Ok(Assembled::Row(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::test_support::ctx;
    use crate::domain::{LoginRecord, ReportFormat};

    fn source_row(section_state: &str, own_state: &str) -> SourceRow {
        SourceRow::new()
            .with("cursor_id", 900)
            .with("course_id", 40)
            .with("course_sis_id", "BIO101")
            .with("nxc_id", None::<i64>)
            .with("nxc_sis_id", None::<String>)
            .with("user_id", 7)
            .with("unique_id", "jdoe")
            .with("pseudonym_sis_id", "U7")
            .with("pseudo_state", "active")
            .with("enrollment_type", "StudentEnrollment")
            .with("role_name", "StudentEnrollment")
            .with("role_id", 3)
            .with("course_section_id", 60)
            .with("section_sis_id", "BIO101-01")
            .with("section_state", section_state)
            .with("course_state", "available")
            .with("workflow_state", own_state)
            .with("associated_user_id", None::<i64>)
            .with("ob_unique_id", None::<String>)
            .with("ob_sis_id", None::<String>)
            .with("sis_batch_id", 4)
            .with("limit_privileges", false)
    }

    fn federated(format: ReportFormat) -> ReportContext {
        let mut ctx = ctx(format);
        ctx.scope.trusted_accounts = vec![AccountId::new(20).unwrap()];
        ctx
    }

    fn remote_login() -> LoginIndex {
        LoginIndex::build(
            vec![LoginRecord {
                id: 1,
                user_id: 7,
                account_id: AccountId::new(20).unwrap(),
                unique_id: "jdoe@partner".to_string(),
                sis_user_id: Some("P7".to_string()),
                position: Some(1),
                account_domain: Some("partner.example.edu".to_string()),
            }],
            AccountId::new(1).unwrap(),
            &[AccountId::new(20).unwrap()],
        )
    }

    fn unwrap_row(assembled: Assembled) -> Row {
        match assembled {
            Assembled::Row(row) => row,
            other => panic!("expected a row, got {other:?}"),
        }
    }

    #[test]
    fn test_deleted_section_forces_deleted_state() {
        let row = unwrap_row(
            row(&ctx(ReportFormat::Sis), &source_row("deleted", "active"), &LoginIndex::default())
                .unwrap(),
        );
        assert_eq!(row[5], Cell::from("deleted"));
    }

    #[test]
    fn test_arity_per_format() {
        let strict = unwrap_row(
            row(&ctx(ReportFormat::Sis), &source_row("active", "active"), &LoginIndex::default())
                .unwrap(),
        );
        assert_eq!(strict.len(), STRICT_HEADERS.len());
        assert_eq!(strict[2], Cell::from("student"));

        let full = unwrap_row(
            row(
                &ctx(ReportFormat::Provisioning),
                &source_row("active", "completed"),
                &LoginIndex::default(),
            )
            .unwrap(),
        );
        assert_eq!(full.len(), PROVISIONING_HEADERS.len());
        assert_eq!(full[2], Cell::Int(7));
        assert_eq!(full[8], Cell::from("concluded"));
        assert_eq!(full[12], Cell::from("StudentEnrollment"));
    }

    #[test]
    fn test_deleted_login_filtered_unless_include_deleted() {
        let r = source_row("active", "active").with("pseudo_state", "deleted");
        let mut ctx = ctx(ReportFormat::Sis);
        assert_eq!(
            row(&ctx, &r, &LoginIndex::default()).unwrap(),
            Assembled::Filtered
        );

        ctx.include_deleted = true;
        assert!(matches!(
            row(&ctx, &r, &LoginIndex::default()).unwrap(),
            Assembled::Row(_)
        ));
    }

    #[test]
    fn test_federated_resolves_remote_login() {
        let r = source_row("active", "active")
            .with("unique_id", None::<String>)
            .with("pseudonym_sis_id", None::<String>);
        let ctx = federated(ReportFormat::Sis);

        assert_eq!(headers(&ctx).last().map(String::as_str), Some("root_account"));
        let row = unwrap_row(row(&ctx, &r, &remote_login()).unwrap());
        assert_eq!(row.len(), STRICT_HEADERS.len() + 1);
        assert_eq!(row[1], Cell::from("P7"));
        assert_eq!(row[8], Cell::from("partner.example.edu"));
    }

    #[test]
    fn test_federated_local_login_uses_root_domain() {
        let ctx = federated(ReportFormat::Sis);
        let row = unwrap_row(
            row(&ctx, &source_row("active", "active"), &LoginIndex::default()).unwrap(),
        );
        assert_eq!(row[1], Cell::from("U7"));
        assert_eq!(row[8], Cell::from("lms.example.edu"));
    }

    #[test]
    fn test_unresolved_login_policies() {
        let r = source_row("active", "active").with("unique_id", None::<String>);

        let strict = federated(ReportFormat::Sis);
        assert_eq!(
            row(&strict, &r, &LoginIndex::default()).unwrap(),
            Assembled::Unresolved
        );

        let full = federated(ReportFormat::Provisioning);
        let emitted = unwrap_row(row(&full, &r, &LoginIndex::default()).unwrap());
        assert_eq!(emitted[3], Cell::Null);

        let mut failing = federated(ReportFormat::Sis);
        failing.unresolved_logins = UnresolvedLoginPolicy::Fail;
        assert!(matches!(
            row(&failing, &r, &LoginIndex::default()),
            Err(RosterError::Export(_))
        ));
    }

    #[test]
    fn test_remote_login_without_sis_id_is_unresolved_in_strict() {
        let r = source_row("active", "active")
            .with("unique_id", None::<String>)
            .with("pseudonym_sis_id", None::<String>);
        let logins = LoginIndex::build(
            vec![LoginRecord {
                id: 2,
                user_id: 7,
                account_id: AccountId::new(20).unwrap(),
                unique_id: "jdoe@partner".to_string(),
                sis_user_id: None,
                position: Some(1),
                account_domain: Some("partner.example.edu".to_string()),
            }],
            AccountId::new(1).unwrap(),
            &[AccountId::new(20).unwrap()],
        );

        let strict = federated(ReportFormat::Sis);
        assert_eq!(row(&strict, &r, &logins).unwrap(), Assembled::Unresolved);

        let mut failing = federated(ReportFormat::Sis);
        failing.unresolved_logins = UnresolvedLoginPolicy::Fail;
        assert!(matches!(
            row(&failing, &r, &logins),
            Err(RosterError::Export(_))
        ));

        // Provisioning output keeps the login and its domain
        let full = federated(ReportFormat::Provisioning);
        let emitted = unwrap_row(row(&full, &r, &logins).unwrap());
        assert_eq!(emitted[3], Cell::Null);
        assert_eq!(
            emitted.last(),
            Some(&Cell::from("partner.example.edu"))
        );
    }

    #[test]
    fn test_unresolved_users_collects_observers() {
        let batch = vec![
            source_row("active", "active")
                .with("unique_id", None::<String>)
                .with("associated_user_id", 8),
            source_row("active", "active").with("user_id", 9),
        ];
        assert_eq!(unresolved_users(&batch).unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_strict_query_requires_all_parent_ids() {
        let q = query(&ctx(ReportFormat::Sis));
        let conditions = q.conditions();
        assert!(conditions.contains(&"cs.sis_source_id IS NOT NULL".to_string()));
        assert!(conditions
            .iter()
            .any(|c| c.contains("'rejected', 'invited', 'creation_pending'")));
        assert!(conditions
            .iter()
            .any(|c| c.starts_with("CASE WHEN cs.nonxlist_course_id IS NULL")));
    }

    #[test]
    fn test_strict_query_requires_user_sis_id() {
        let q = query(&ctx(ReportFormat::Sis));
        assert!(q
            .conditions()
            .contains(&"pseudo.sis_user_id IS NOT NULL".to_string()));

        let q = query(&federated(ReportFormat::Sis));
        assert!(q.conditions().contains(
            &"pseudo.sis_user_id IS NOT NULL OR pseudo.unique_id IS NULL".to_string()
        ));

        let q = query(&ctx(ReportFormat::Provisioning));
        assert!(!q.conditions().iter().any(|c| c.contains("pseudo.sis_user_id")));
    }

    #[test]
    fn test_include_deleted_keeps_sis_enrollments() {
        let mut ctx = ctx(ReportFormat::Provisioning);
        ctx.include_deleted = true;
        let q = query(&ctx);
        assert!(q
            .conditions()
            .contains(&"e.workflow_state <> 'deleted' OR e.sis_batch_id IS NOT NULL".to_string()));
    }
}
