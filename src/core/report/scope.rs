//! Filter layers shared by several reports
//!
//! Each helper appends conditions (and binds parameters) to a [`Select`].

use crate::core::report::context::ReportContext;
use crate::core::report::query::{Select, SqlParam};
use crate::domain::AccountId;

/// Subquery yielding `account` and every account below it
pub fn subtree_sql(q: &mut Select, account: AccountId) -> String {
    let id = q.bind(SqlParam::Int(account.get()));
    format!(
        "WITH RECURSIVE subtree(id) AS (SELECT {id}::bigint UNION ALL \
         SELECT a.id FROM accounts a JOIN subtree s ON a.parent_account_id = s.id) \
         SELECT id FROM subtree"
    )
}

/// Excludes users whose only presence is a test-student (preview) enrollment
pub fn exclude_test_students(q: &mut Select, user_column: &str) {
    q.filter(format!(
        "NOT EXISTS (SELECT 1 FROM enrollments e WHERE e.type = 'StudentViewEnrollment' \
         AND e.user_id = {user_column})"
    ));
}

/// Requires `column` to be non-null when the export is limited to records
/// created by a SIS import
pub fn created_by_sis(q: &mut Select, ctx: &ReportContext, batch_column: &str) {
    if ctx.created_by_sis {
        q.filter(format!("{batch_column} IS NOT NULL"));
    }
}

/// Requires every listed external id column to be present in strict format
pub fn strict_ids(q: &mut Select, ctx: &ReportContext, columns: &[&str]) {
    if ctx.strict() {
        for column in columns {
            q.filter(format!("{column} IS NOT NULL"));
        }
    }
}

/// Default deletion policy: drop deleted rows, or keep them when they still
/// carry the given identifier
pub fn deleted_policy(q: &mut Select, ctx: &ReportContext, state_column: &str, keep_if: &str) {
    if ctx.include_deleted {
        q.filter(format!("{state_column} <> 'deleted' OR {keep_if} IS NOT NULL"));
    } else {
        q.filter(format!("{state_column} <> 'deleted'"));
    }
}

/// Restricts a course-bearing query to the sub-account tree (recursive) and
/// to the requested term
pub fn course_scope(q: &mut Select, ctx: &ReportContext, course_alias: &str) {
    if let Some(sub) = &ctx.scope.sub_account {
        let subtree = subtree_sql(q, sub.id);
        q.filter(format!("{course_alias}.account_id IN ({subtree})"));
    }
    term_scope(q, ctx, course_alias);
}

pub fn term_scope(q: &mut Select, ctx: &ReportContext, course_alias: &str) {
    if let Some(term) = &ctx.scope.term {
        let id = q.bind(SqlParam::Int(term.id.get()));
        q.filter(format!("{course_alias}.enrollment_term_id = {id}"));
    }
}

/// Restricts a login-based query to users associated with the sub-account
pub fn user_scope(q: &mut Select, ctx: &ReportContext, user_column: &str) {
    if let Some(sub) = &ctx.scope.sub_account {
        let id = q.bind(SqlParam::Int(sub.id.get()));
        q.filter(format!(
            "EXISTS (SELECT 1 FROM user_account_associations uaa \
             WHERE uaa.user_id = {user_column} AND uaa.account_id = {id})"
        ));
    }
}

/// Restricts a group query to groups whose context lives in the sub-account
/// tree; account groups by their account, course groups by the course's
/// account
pub fn group_context_scope(q: &mut Select, ctx: &ReportContext, group_alias: &str) {
    let Some(sub) = &ctx.scope.sub_account else {
        return;
    };
    q.add_join(format!(
        "LEFT JOIN courses gc ON {group_alias}.context_type = 'Course' AND gc.id = {group_alias}.context_id"
    ));
    let accounts = subtree_sql(q, sub.id);
    let courses = subtree_sql(q, sub.id);
    q.filter(format!(
        "({group_alias}.context_type = 'Account' AND {group_alias}.account_id IN ({accounts})) \
         OR ({group_alias}.context_type = 'Course' AND gc.account_id IN ({courses}))"
    ));
}

/// External id of the course a section reports against: the original course
/// while cross-listed, otherwise its current course
pub fn reported_course_sis(section: &str, course: &str, original: &str) -> String {
    format!(
        "CASE WHEN {section}.nonxlist_course_id IS NULL THEN {course}.sis_source_id \
         ELSE {original}.sis_source_id END"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::context::Scope;
    use crate::domain::{AccountRecord, ReportFormat, TermId, TermRecord};

    fn ctx() -> ReportContext {
        let root = AccountRecord {
            id: AccountId::new(1).unwrap(),
            root_account_id: None,
            parent_account_id: None,
            name: "Root".to_string(),
            domain: None,
        };
        ReportContext::new(ReportFormat::Sis, Scope::root_only(root))
    }

    fn sub(ctx: &mut ReportContext, id: i64) {
        ctx.scope.sub_account = Some(AccountRecord {
            id: AccountId::new(id).unwrap(),
            root_account_id: Some(AccountId::new(1).unwrap()),
            parent_account_id: Some(AccountId::new(1).unwrap()),
            name: "Sub".to_string(),
            domain: None,
        });
    }

    #[test]
    fn test_subtree_binds_account() {
        let mut q = Select::new("x", "t", "t.id");
        let sql = subtree_sql(&mut q, AccountId::new(9).unwrap());
        assert!(sql.contains("SELECT $1::bigint"));
        assert!(sql.starts_with("WITH RECURSIVE"));
        assert_eq!(q.params(), &[SqlParam::Int(9)]);
    }

    #[test]
    fn test_course_scope_without_restrictions_is_noop() {
        let mut q = Select::new("x", "courses c", "c.id");
        course_scope(&mut q, &ctx(), "c");
        assert!(q.conditions().is_empty());
    }

    #[test]
    fn test_course_scope_with_sub_account_and_term() {
        let mut ctx = ctx();
        sub(&mut ctx, 5);
        ctx.scope.term = Some(TermRecord {
            id: TermId::new(3).unwrap(),
            root_account_id: AccountId::new(1).unwrap(),
            name: "Fall".to_string(),
        });
        let mut q = Select::new("x", "courses c", "c.id");
        course_scope(&mut q, &ctx, "c");
        assert_eq!(q.conditions().len(), 2);
        assert!(q.conditions()[0].starts_with("c.account_id IN (WITH RECURSIVE"));
        assert_eq!(q.conditions()[1], "c.enrollment_term_id = $2");
        assert_eq!(q.params(), &[SqlParam::Int(5), SqlParam::Int(3)]);
    }

    #[test]
    fn test_deleted_policy() {
        let mut ctx = ctx();
        let mut q = Select::new("x", "t", "t.id");
        deleted_policy(&mut q, &ctx, "t.workflow_state", "t.sis_source_id");
        assert_eq!(q.conditions(), &["t.workflow_state <> 'deleted'".to_string()]);

        ctx.include_deleted = true;
        let mut q = Select::new("x", "t", "t.id");
        deleted_policy(&mut q, &ctx, "t.workflow_state", "t.sis_source_id");
        assert_eq!(
            q.conditions(),
            &["t.workflow_state <> 'deleted' OR t.sis_source_id IS NOT NULL".to_string()]
        );
    }

    #[test]
    fn test_created_by_sis_only_when_requested() {
        let mut ctx = ctx();
        let mut q = Select::new("x", "t", "t.id");
        created_by_sis(&mut q, &ctx, "t.sis_batch_id");
        assert!(q.conditions().is_empty());

        ctx.created_by_sis = true;
        created_by_sis(&mut q, &ctx, "t.sis_batch_id");
        assert_eq!(q.conditions(), &["t.sis_batch_id IS NOT NULL".to_string()]);
    }

    #[test]
    fn test_group_context_scope_adds_course_join() {
        let mut ctx = ctx();
        sub(&mut ctx, 7);
        let mut q = Select::new("x", "groups g", "g.id");
        group_context_scope(&mut q, &ctx, "g");
        assert!(q.render().contains("LEFT JOIN courses gc"));
        assert_eq!(q.params(), &[SqlParam::Int(7), SqlParam::Int(7)]);
    }
}
