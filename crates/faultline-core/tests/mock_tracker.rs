//! Contract tests against a mocked IssueTracker.
//!
//! The mock pins down exactly which tracker calls the engine makes, and
//! with which arguments, for the create and escalate paths.

use async_trait::async_trait;
use faultline_cache::DedupCache;
use faultline_core::{FaultReporter, ReporterSettings};
use faultline_report::{FaultReport, Severity};
use faultline_tracker::{CreatedIssue, IssueTracker, TrackerError};
use mockall::predicate::eq;
use std::sync::Arc;

mockall::mock! {
    pub Tracker {}

    #[async_trait]
    impl IssueTracker for Tracker {
        fn is_configured(&self) -> bool;
        async fn create_issue(&self, title: &str, body: &str, priority: u8) -> Result<CreatedIssue, TrackerError>;
        async fn add_comment(&self, issue_id: &str, body: &str) -> Result<(), TrackerError>;
    }
}

impl std::fmt::Debug for MockTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MockTracker")
    }
}

fn reporter(mock: MockTracker) -> FaultReporter {
    let settings = ReporterSettings::new().with_app_name("Shop");
    FaultReporter::new(Arc::new(mock), DedupCache::new(), settings)
}

fn issue() -> CreatedIssue {
    CreatedIssue {
        id: "lin-uuid".to_string(),
        identifier: "SHOP-12".to_string(),
        url: "https://linear.app/shop/issue/SHOP-12".to_string(),
    }
}

#[tokio::test]
async fn unconfigured_makes_no_calls() {
    let mut mock = MockTracker::new();
    mock.expect_is_configured().return_const(false);
    mock.expect_create_issue().never();
    mock.expect_add_comment().never();

    let reporter = reporter(mock);
    let report = FaultReport::new("boom").unwrap();
    assert!(reporter.report(report).await.is_none());
}

#[tokio::test]
async fn warning_creates_priority_three_issue_then_comments() {
    let mut mock = MockTracker::new();
    mock.expect_is_configured().return_const(true);
    mock.expect_create_issue()
        .withf(|title, body, priority| {
            title == "[Shop] WARNING: slow query" && body.contains("**Severity:** warning") && *priority == 3
        })
        .times(1)
        .returning(|_, _, _| Ok(issue()));
    mock.expect_add_comment()
        .with(eq("lin-uuid"), mockall::predicate::str::contains("Count: 2"))
        .times(1)
        .returning(|_, _| Ok(()));

    let reporter = reporter(mock);
    let report = || {
        FaultReport::new("slow query")
            .unwrap()
            .with_severity(Severity::Warning)
    };

    let first = reporter.report(report()).await.unwrap();
    assert_eq!(first.identifier, "SHOP-12");
    assert_eq!(first.url, "https://linear.app/shop/issue/SHOP-12");

    let second = reporter.report(report()).await.unwrap();
    assert!(second.is_duplicate);
    assert_eq!(second.issue_id, "lin-uuid");
}

#[tokio::test]
async fn create_failure_returns_none() {
    let mut mock = MockTracker::new();
    mock.expect_is_configured().return_const(true);
    mock.expect_create_issue()
        .times(1)
        .returning(|_, _, _| Err(TrackerError::NotConfigured("team_id")));

    let reporter = reporter(mock);
    let report = FaultReport::new("boom").unwrap();
    assert!(reporter.report(report).await.is_none());
    assert!(reporter.cache().is_empty());
}
