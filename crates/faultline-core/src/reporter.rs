//! Fault reporting engine
//!
//! Owns the dedup cache handle, the tracker and a clock, and decides for
//! every fault whether to escalate an existing issue or open a new one.

use crate::capture::report_from_error;
use crate::config::{FaultlineConfig, ReporterSettings};
use crate::error::CoreError;
use crate::types::{ErrorContext, FaultResult};
use chrono::{DateTime, TimeDelta, Utc};
use faultline_cache::{Claim, Clock, DedupCache, InFlightGuard, SystemClock};
use faultline_report::{
    escalation_comment, format_body, priority_for, title_for, FaultReport, Fingerprint,
};
use faultline_tracker::{IssueTracker, LinearClient, TrackerError};
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// The fault reporting engine
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct FaultReporter {
    tracker: Arc<dyn IssueTracker>,
    cache: DedupCache,
    clock: Arc<dyn Clock>,
    settings: ReporterSettings,
}

impl FaultReporter {
    /// Create an engine over an existing tracker and cache
    #[must_use]
    pub fn new(tracker: Arc<dyn IssueTracker>, cache: DedupCache, settings: ReporterSettings) -> Self {
        Self {
            tracker,
            cache,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    /// Build the Linear-backed engine described by `config`
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for invalid settings and
    /// [`CoreError::Tracker`] if the HTTP client cannot be built
    pub fn from_config(config: &FaultlineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let tracker = LinearClient::new(config.tracker.clone())?;
        let cache = DedupCache::with_window(config.dedup.window()?);
        Ok(Self::new(Arc::new(tracker), cache, config.reporter.clone()))
    }

    /// With a custom time source
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether reports will reach the tracker
    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.tracker.is_configured()
    }

    /// Dedup state shared with this engine
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ReporterSettings {
        &self.settings
    }

    /// Forget every tracked fault
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Report a fault
    ///
    /// # Workflow
    /// 1. Skip when the tracker is unconfigured
    /// 2. Fingerprint and claim the fingerprint in the dedup cache
    /// 3. Repeat: comment on the existing issue (failure tolerated)
    /// 4. First occurrence: create an issue and seed the cache
    ///
    /// # Returns
    /// `None` when reporting was skipped or the issue could not be created.
    /// Tracker failures never escape as errors.
    pub async fn report(&self, report: FaultReport) -> Option<FaultResult> {
        if !self.tracker.is_configured() {
            tracing::info!("fault tracker not configured, skipping report");
            return None;
        }

        let fingerprint = Fingerprint::of(&report);
        let now = self.clock.now();

        match self.cache.claim(fingerprint, now) {
            Claim::Repeat { issue_id, count } => {
                Some(self.escalate(&fingerprint, issue_id, count, now).await)
            }
            Claim::First(guard) => self.create(&report, guard, now).await,
            Claim::InFlight => {
                tracing::debug!(
                    fingerprint = %fingerprint.short(),
                    "issue creation in flight, occurrence counted against it"
                );
                None
            }
        }
    }

    /// Report a caught error
    ///
    /// Captures the error message, its source chain and a backtrace, then
    /// forwards to [`report`](Self::report) with severity `error`.
    pub async fn report_error<E>(&self, error: &E, context: ErrorContext) -> Option<FaultResult>
    where
        E: Error + ?Sized,
    {
        match report_from_error(error, context) {
            Ok(report) => self.report(report).await,
            Err(e) => {
                tracing::warn!(error = %e, "cannot report error");
                None
            }
        }
    }

    /// Periodically purge expired cache entries
    ///
    /// Lazy expiry already keeps lookups correct; the sweep only bounds
    /// memory for fingerprints that never recur.
    #[must_use]
    pub fn spawn_expiry_sweep(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.cache.clone();
        let clock = Arc::clone(&self.clock);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired(clock.now());
                if removed > 0 {
                    tracing::debug!(removed, "purged expired fault records");
                }
            }
        })
    }

    async fn escalate(
        &self,
        fingerprint: &Fingerprint,
        issue_id: String,
        count: u32,
        now: DateTime<Utc>,
    ) -> FaultResult {
        let comment = escalation_comment(count, now);
        match self.bounded(self.tracker.add_comment(&issue_id, &comment)).await {
            Ok(()) => tracing::debug!(
                fingerprint = %fingerprint.short(),
                issue = %issue_id,
                count,
                "escalated repeat fault"
            ),
            Err(e) => tracing::warn!(
                fingerprint = %fingerprint.short(),
                issue = %issue_id,
                count,
                error = %e,
                "escalation comment failed"
            ),
        }
        FaultResult::duplicate(issue_id, &self.settings.duplicate_url_base)
    }

    async fn create(
        &self,
        report: &FaultReport,
        guard: InFlightGuard,
        now: DateTime<Utc>,
    ) -> Option<FaultResult> {
        let title = title_for(&self.settings.app_name, report.severity(), report.message());
        let body = format_body(report, &self.settings.environment, now);
        let priority = priority_for(report.severity());

        match self.bounded(self.tracker.create_issue(&title, &body, priority)).await {
            Ok(issue) => {
                tracing::info!(
                    fingerprint = %guard.fingerprint().short(),
                    issue = %issue.identifier,
                    "created issue for fault"
                );
                guard.commit(issue.id.clone(), now);
                Some(FaultResult::created(issue))
            }
            Err(e) => {
                // Guard drops here, so the next occurrence retries creation
                tracing::warn!(
                    fingerprint = %guard.fingerprint().short(),
                    error = %e,
                    "issue creation failed, fault not tracked"
                );
                None
            }
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, TrackerError>
    where
        F: Future<Output = Result<T, TrackerError>>,
    {
        let limit = self.settings.call_timeout();
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(TrackerError::Timeout(limit)))
    }
}
