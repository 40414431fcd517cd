//! Report definitions
//!
//! One module per catalog entry. Each holds the strict and provisioning
//! header contracts, the scoped query, and the assembly of output rows from
//! source rows. [`headers`], [`query`] and [`assemble`] dispatch on
//! [`ReportKind`].
//!
//! # Filter layers
//!
//! Reports apply, where relevant: the base relation under the root account,
//! test-student exclusion, the strict-format external id requirement, the
//! created-by-SIS restriction, the deletion policy, sub-account scope and
//! term scope. The helpers live in [`scope`].

pub mod accounts;
pub mod context;
pub mod courses;
pub mod enrollments;
pub mod group_categories;
pub mod group_membership;
pub mod groups;
pub mod query;
pub mod scope;
pub mod sections;
pub mod terms;
pub mod trust;
pub mod user_observers;
pub mod users;
pub mod xlist;

pub use context::{HeaderLabels, ReportContext, Scope};
pub use query::{Select, SqlParam};

use crate::adapters::database::ReportSource;
use crate::domain::{ReportKind, Result, Row, SourceRow};

/// Rows assembled from one source page
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub rows: Vec<Row>,
    /// Source rows that could not be represented and were left out
    pub skipped: u64,
}

impl BatchResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows, skipped: 0 }
    }
}

/// Whether the report exists in the context's format
///
/// Group categories have no strict import file.
pub fn available(kind: ReportKind, ctx: &ReportContext) -> bool {
    !(kind == ReportKind::GroupCategories && ctx.strict())
}

/// Header row of a report, `None` when it is unavailable in this format
pub fn headers(kind: ReportKind, ctx: &ReportContext) -> Option<Vec<String>> {
    if !available(kind, ctx) {
        return None;
    }
    let headers = match kind {
        ReportKind::Users => ctx.headers(users::STRICT_HEADERS, users::PROVISIONING_HEADERS),
        ReportKind::Accounts => {
            ctx.headers(accounts::STRICT_HEADERS, accounts::PROVISIONING_HEADERS)
        }
        ReportKind::Terms => ctx.headers(terms::STRICT_HEADERS, terms::PROVISIONING_HEADERS),
        ReportKind::Courses => ctx.headers(courses::STRICT_HEADERS, courses::PROVISIONING_HEADERS),
        ReportKind::Sections => {
            ctx.headers(sections::STRICT_HEADERS, sections::PROVISIONING_HEADERS)
        }
        ReportKind::Enrollments => enrollments::headers(ctx),
        ReportKind::Groups => ctx.headers(groups::STRICT_HEADERS, groups::PROVISIONING_HEADERS),
        ReportKind::GroupMembership => ctx.headers(
            group_membership::STRICT_HEADERS,
            group_membership::PROVISIONING_HEADERS,
        ),
        ReportKind::GroupCategories => ctx.headers(&[], group_categories::PROVISIONING_HEADERS),
        ReportKind::Xlist => ctx.headers(xlist::STRICT_HEADERS, xlist::PROVISIONING_HEADERS),
        ReportKind::UserObservers => ctx.headers(
            user_observers::STRICT_HEADERS,
            user_observers::PROVISIONING_HEADERS,
        ),
    };
    Some(headers)
}

/// Scoped query of a report, `None` when it is unavailable in this format
pub fn query(kind: ReportKind, ctx: &ReportContext) -> Option<Select> {
    if !available(kind, ctx) {
        return None;
    }
    let select = match kind {
        ReportKind::Users => users::query(ctx),
        ReportKind::Accounts => accounts::query(ctx),
        ReportKind::Terms => terms::query(ctx),
        ReportKind::Courses => courses::query(ctx),
        ReportKind::Sections => sections::query(ctx),
        ReportKind::Enrollments => enrollments::query(ctx),
        ReportKind::Groups => groups::query(ctx),
        ReportKind::GroupMembership => group_membership::query(ctx),
        ReportKind::GroupCategories => group_categories::query(ctx),
        ReportKind::Xlist => xlist::query(ctx),
        ReportKind::UserObservers => user_observers::query(ctx),
    };
    Some(select)
}

/// Turns one page of source rows into output rows
///
/// Batch-scoped lookups (emails, cross-account logins) are issued here, once
/// per page.
///
/// # Errors
///
/// Source failures propagate unchanged. A missing or mistyped column is a
/// [`crate::domain::SourceError`].
pub async fn assemble(
    kind: ReportKind,
    ctx: &ReportContext,
    source: &dyn ReportSource,
    batch: &[SourceRow],
) -> Result<BatchResult> {
    let per_row = |f: fn(&ReportContext, &SourceRow) -> Result<Row>| -> Result<BatchResult> {
        batch
            .iter()
            .map(|r| f(ctx, r))
            .collect::<Result<Vec<Row>>>()
            .map(BatchResult::from_rows)
    };

    match kind {
        ReportKind::Users => users::assemble(ctx, source, batch).await,
        ReportKind::Enrollments => enrollments::assemble(ctx, source, batch).await,
        ReportKind::Accounts => per_row(accounts::row),
        ReportKind::Terms => per_row(terms::row),
        ReportKind::Courses => per_row(courses::row),
        ReportKind::Sections => per_row(sections::row),
        ReportKind::Groups => per_row(groups::row),
        ReportKind::GroupMembership => per_row(group_membership::row),
        ReportKind::GroupCategories => per_row(group_categories::row),
        ReportKind::Xlist => per_row(xlist::row),
        ReportKind::UserObservers => per_row(user_observers::row),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ctx;
    use super::*;
    use crate::domain::ReportFormat;

    #[test]
    fn test_group_categories_unavailable_in_strict() {
        let strict = ctx(ReportFormat::Sis);
        assert!(headers(ReportKind::GroupCategories, &strict).is_none());
        assert!(query(ReportKind::GroupCategories, &strict).is_none());

        let full = ctx(ReportFormat::Provisioning);
        assert_eq!(
            headers(ReportKind::GroupCategories, &full).unwrap()[0],
            "canvas_group_category_id"
        );
    }

    #[test]
    fn test_every_query_is_named_after_its_report() {
        let full = ctx(ReportFormat::Provisioning);
        for kind in ReportKind::CATALOG {
            assert_eq!(query(kind, &full).unwrap().name(), kind.as_str());
        }
    }

    #[test]
    fn test_provisioning_headers_lead_with_internal_id() {
        let full = ctx(ReportFormat::Provisioning);
        let strict = ctx(ReportFormat::Sis);
        for kind in ReportKind::CATALOG {
            let full_headers = headers(kind, &full).unwrap();
            assert!(full_headers[0].starts_with("canvas_"), "{kind}");
            if let Some(strict_headers) = headers(kind, &strict) {
                assert!(strict_headers.iter().all(|h| !h.starts_with("canvas_")), "{kind}");
            }
        }
    }
}
