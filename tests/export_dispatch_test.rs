//! Integration tests for report dispatch and scope resolution

mod common;

use common::{acct, enrollment_row, term_row, user_row, FixtureSource};
use roster::core::export::{ExportCoordinator, ReportSet};
use roster::core::report::terms;
use roster::domain::{Cell, ReportFormat, ReportKind, ReportRequest, RosterError, TermId};

fn request(names: &[&str]) -> ReportRequest {
    ReportRequest::new(names.iter().copied()).with_format(ReportFormat::Sis)
}

#[tokio::test]
async fn test_no_known_reports_yield_empty_set() {
    let (fixture, source) = FixtureSource::new().shared();
    let coordinator = ExportCoordinator::new(source, acct(1), request(&["bogus", "grades"]));

    let output = coordinator.prepare().await.unwrap();

    assert!(matches!(output.reports, ReportSet::Empty));
    assert_eq!(output.extra_text, "Reports: ");
    assert_eq!(fixture.pages(), 0);
}

#[tokio::test]
async fn test_single_report_is_unwrapped() {
    let source = FixtureSource::new()
        .with_rows(
            "terms",
            vec![term_row(3, "SP25", "Spring 2025"), term_row(1, "FA24", "Fall 2024")],
        )
        .into_arc();
    let coordinator = ExportCoordinator::new(source, acct(1), request(&["terms"]));

    let output = coordinator.prepare().await.unwrap();
    assert_eq!(output.extra_text, "Reports: terms ");

    let ReportSet::Single(stream) = output.reports else {
        panic!("expected a single stream");
    };
    assert_eq!(stream.kind(), ReportKind::Terms);
    assert_eq!(stream.header().unwrap(), terms::STRICT_HEADERS);

    let rows = stream.collect_rows().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], Cell::Text("FA24".to_string()));
    assert_eq!(rows[1][0], Cell::Text("SP25".to_string()));
    for row in &rows {
        assert_eq!(row.len(), terms::STRICT_HEADERS.len());
    }
}

#[tokio::test]
async fn test_multiple_reports_keyed_in_catalog_order() {
    let (fixture, source) = FixtureSource::new()
        .with_rows("users", vec![user_row(1, 7, "U7", "Doe, Jane")])
        .with_rows("enrollments", vec![enrollment_row(1, 7, Some("U7"))])
        .shared();
    let coordinator = ExportCoordinator::new(
        source,
        acct(1),
        request(&["enrollments", "bogus", "users", "terms", "users"]),
    );

    let output = coordinator.prepare().await.unwrap();
    assert_eq!(output.extra_text, "Reports: users terms enrollments ");

    let kinds = output.reports.kinds();
    assert_eq!(
        kinds,
        vec![ReportKind::Users, ReportKind::Terms, ReportKind::Enrollments]
    );

    // Streams are lazy until a row is pulled
    assert_eq!(fixture.pages(), 0);

    let ReportSet::Multiple(mut streams) = output.reports else {
        panic!("expected keyed streams");
    };
    let enrollments = streams.remove(&ReportKind::Enrollments).unwrap();
    let header_len = enrollments.header().unwrap().len();
    let rows = enrollments.collect_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), header_len);
    assert_eq!(rows[0][1], Cell::Text("U7".to_string()));
}

#[tokio::test]
async fn test_group_categories_unavailable_in_sis_format() {
    let (fixture, source) = FixtureSource::new().shared();
    let coordinator = ExportCoordinator::new(source, acct(1), request(&["group_categories"]));

    let output = coordinator.prepare().await.unwrap();
    let ReportSet::Single(stream) = output.reports else {
        panic!("expected a single stream");
    };
    assert!(!stream.is_available());
    assert!(stream.header().is_none());
    assert!(stream.collect_rows().await.unwrap().is_empty());
    assert_eq!(fixture.pages(), 0);
}

#[tokio::test]
async fn test_group_categories_available_in_provisioning_format() {
    let source = FixtureSource::new().into_arc();
    let coordinator = ExportCoordinator::new(
        source,
        acct(1),
        ReportRequest::new(["group_categories"]).with_format(ReportFormat::Provisioning),
    );

    let output = coordinator.prepare().await.unwrap();
    let ReportSet::Single(stream) = output.reports else {
        panic!("expected a single stream");
    };
    assert_eq!(stream.header().unwrap()[0], "canvas_group_category_id");
}

#[tokio::test]
async fn test_term_and_deleted_flag_in_extra_text() {
    let source = FixtureSource::new().into_arc();
    let coordinator = ExportCoordinator::new(
        source,
        acct(1),
        request(&["courses"])
            .with_term(Some(TermId::new(14).unwrap()))
            .with_include_deleted(true),
    );

    let output = coordinator.prepare().await.unwrap();
    assert_eq!(
        output.extra_text,
        "Term: Fall 2024; Include Deleted Objects; Reports: courses "
    );
}

#[tokio::test]
async fn test_sub_account_equal_to_root_is_ignored() {
    let coordinator = ExportCoordinator::new(
        FixtureSource::new().into_arc(),
        acct(1),
        request(&["courses"]).with_sub_account(Some(acct(1))),
    );

    let scope = coordinator.resolve_scope().await.unwrap();
    assert!(scope.sub_account.is_none());
    assert_eq!(scope.root.id, acct(1));
}

#[tokio::test]
async fn test_sub_account_resolved() {
    let coordinator = ExportCoordinator::new(
        FixtureSource::new().into_arc(),
        acct(1),
        request(&["courses"]).with_sub_account(Some(acct(5))),
    );

    let scope = coordinator.resolve_scope().await.unwrap();
    assert_eq!(scope.sub_account.unwrap().id, acct(5));
}

#[tokio::test]
async fn test_sub_account_outside_root_rejected() {
    let coordinator = ExportCoordinator::new(
        FixtureSource::new().into_arc(),
        acct(1),
        request(&["courses"]).with_sub_account(Some(acct(2))),
    );

    let err = coordinator.prepare().await.unwrap_err();
    assert!(matches!(err, RosterError::Validation(_)));
}

#[tokio::test]
async fn test_unknown_term_rejected() {
    let coordinator = ExportCoordinator::new(
        FixtureSource::new().into_arc(),
        acct(1),
        request(&["courses"]).with_term(Some(TermId::new(99).unwrap())),
    );

    let err = coordinator.prepare().await.unwrap_err();
    assert!(matches!(err, RosterError::Validation(ref m) if m.contains("99")));
}

#[tokio::test]
async fn test_non_root_account_rejected() {
    let coordinator =
        ExportCoordinator::new(FixtureSource::new().into_arc(), acct(5), request(&["users"]));
    assert!(matches!(
        coordinator.prepare().await.unwrap_err(),
        RosterError::Validation(_)
    ));

    let coordinator =
        ExportCoordinator::new(FixtureSource::new().into_arc(), acct(77), request(&["users"]));
    assert!(matches!(
        coordinator.prepare().await.unwrap_err(),
        RosterError::Validation(_)
    ));
}
