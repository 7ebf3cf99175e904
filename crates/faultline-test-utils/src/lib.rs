//! Testing utilities for Faultline workspace
//!
//! Shared fakes, fixtures, and a controllable clock.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use faultline_cache::{Clock, DedupCache};
use faultline_core::{FaultReporter, ReporterSettings};
use faultline_report::FaultReport;
use faultline_tracker::{CreatedIssue, IssueTracker, TrackerError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One call observed by [`RecordingTracker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    Create { title: String, body: String, priority: u8 },
    Comment { issue_id: String, body: String },
}

/// In-memory tracker that records every call
///
/// Issues are numbered `issue-1`, `issue-2`, ... with identifiers `FLT-n`.
#[derive(Debug)]
pub struct RecordingTracker {
    configured: bool,
    fail_create: AtomicBool,
    fail_comment: AtomicBool,
    create_delay: Mutex<Option<Duration>>,
    next_issue: AtomicU32,
    calls: Mutex<Vec<TrackerCall>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self {
            configured: true,
            fail_create: AtomicBool::new(false),
            fail_comment: AtomicBool::new(false),
            create_delay: Mutex::new(None),
            next_issue: AtomicU32::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A tracker whose `is_configured` is false
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_comments(&self, fail: bool) {
        self.fail_comment.store(fail, Ordering::SeqCst);
    }

    /// Make `create_issue` sleep before answering
    pub fn delay_creates(&self, delay: Duration) {
        *self.create_delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.lock().clone()
    }

    pub fn create_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, TrackerCall::Create { .. }))
            .count()
    }

    pub fn comment_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, TrackerCall::Comment { .. }))
            .count()
    }
}

impl Default for RecordingTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueTracker for RecordingTracker {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        priority: u8,
    ) -> Result<CreatedIssue, TrackerError> {
        self.calls.lock().push(TrackerCall::Create {
            title: title.to_string(),
            body: body.to_string(),
            priority,
        });

        let delay = *self.create_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_create.load(Ordering::SeqCst) {
            return Err(TrackerError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let n = self.next_issue.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedIssue {
            id: format!("issue-{n}"),
            identifier: format!("FLT-{n}"),
            url: format!("https://tracker.test/FLT-{n}"),
        })
    }

    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<(), TrackerError> {
        self.calls.lock().push(TrackerCall::Comment {
            issue_id: issue_id.to_string(),
            body: body.to_string(),
        });
        if self.fail_comment.load(Ordering::SeqCst) {
            return Err(TrackerError::GraphQl("comment rejected".to_string()));
        }
        Ok(())
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Clock starting at 2024-01-01T00:00:00Z
    pub fn at_epoch() -> Self {
        Self::new(epoch())
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Fixed starting instant used by fixtures
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The "DB timeout" fault used across engine tests
pub fn db_timeout_report() -> FaultReport {
    FaultReport::new("DB timeout")
        .expect("fixture message is not blank")
        .with_stack("Error: timeout\nat foo()")
}

/// Engine wired to a recording tracker and a manual clock
pub struct Harness {
    pub reporter: FaultReporter,
    pub tracker: Arc<RecordingTracker>,
    pub clock: Arc<ManualClock>,
}

pub fn harness_with(tracker: RecordingTracker) -> Harness {
    let tracker = Arc::new(tracker);
    let clock = Arc::new(ManualClock::at_epoch());
    let settings = ReporterSettings::new()
        .with_app_name("TestApp")
        .with_environment("test");
    let reporter = FaultReporter::new(tracker.clone(), DedupCache::new(), settings)
        .with_clock(clock.clone());
    Harness {
        reporter,
        tracker,
        clock,
    }
}

pub fn harness() -> Harness {
    harness_with(RecordingTracker::new())
}
