//! Fingerprint -> occurrence cache with a sliding expiry window

use crate::error::CacheError;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use faultline_report::Fingerprint;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default dedup window (1 hour)
pub const DEFAULT_WINDOW_SECS: i64 = 60 * 60;

/// Occurrence bookkeeping for one tracked fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceRecord {
    issue_id: String,
    count: u32,
    last_seen: DateTime<Utc>,
}

impl OccurrenceRecord {
    fn first(issue_id: String, now: DateTime<Utc>) -> Self {
        Self {
            issue_id,
            count: 1,
            last_seen: now,
        }
    }

    fn bump(&mut self, now: DateTime<Utc>) -> u32 {
        self.count = self.count.saturating_add(1);
        self.last_seen = now;
        self.count
    }

    /// Tracker handle of the open issue
    #[inline]
    #[must_use]
    pub fn issue_id(&self) -> &str {
        &self.issue_id
    }

    /// Occurrences seen so far (>= 1)
    #[inline]
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }
}

#[derive(Debug, Clone)]
enum Slot {
    /// Issue creation in progress; `token` identifies the claimer and
    /// `pending` counts occurrences that arrived meanwhile
    InFlight {
        since: DateTime<Utc>,
        token: u64,
        pending: u32,
    },
    Tracked(OccurrenceRecord),
}

/// Outcome of [`DedupCache::claim`]
#[derive(Debug)]
pub enum Claim {
    /// Live record found; count already incremented
    Repeat {
        /// Existing issue
        issue_id: String,
        /// Count after this occurrence
        count: u32,
    },
    /// No live record; the caller now owns issue creation
    First(InFlightGuard),
    /// Another caller is creating the issue for this fingerprint; the
    /// occurrence is folded into the count it will commit
    InFlight,
}

/// Dedup cache
///
/// Cheap to clone; clones share the same entries. One instance is meant to
/// be built at startup and handed to every engine that should share dedup
/// state.
#[derive(Debug, Clone)]
pub struct DedupCache {
    entries: Arc<DashMap<Fingerprint, Slot>>,
    window: TimeDelta,
    tokens: Arc<AtomicU64>,
}

impl DedupCache {
    /// Create cache with the default 1 hour window
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(TimeDelta::seconds(DEFAULT_WINDOW_SECS))
    }

    /// Create cache with a custom window
    #[must_use]
    pub fn with_window(window: TimeDelta) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            window,
            tokens: Arc::new(AtomicU64::new(1)),
        }
    }

    #[inline]
    #[must_use]
    pub fn window(&self) -> TimeDelta {
        self.window
    }

    #[inline]
    fn is_expired(&self, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_seen) > self.window
    }

    fn slot_expired(&self, slot: &Slot, now: DateTime<Utc>) -> bool {
        match slot {
            Slot::InFlight { since, .. } => self.is_expired(*since, now),
            Slot::Tracked(record) => self.is_expired(record.last_seen, now),
        }
    }

    /// Read a live record
    ///
    /// An expired record is evicted and reported as absent. In-flight
    /// markers are not records and read as absent too.
    pub fn lookup(&self, fingerprint: &Fingerprint, now: DateTime<Utc>) -> Option<OccurrenceRecord> {
        let Entry::Occupied(occupied) = self.entries.entry(*fingerprint) else {
            return None;
        };
        let expired = match occupied.get() {
            Slot::Tracked(record) => {
                if !self.is_expired(record.last_seen, now) {
                    return Some(record.clone());
                }
                true
            }
            Slot::InFlight { .. } => false,
        };
        if expired {
            occupied.remove();
            tracing::debug!(fingerprint = %fingerprint.short(), "evicted expired fault record");
        }
        None
    }

    /// Start tracking a fingerprint with count 1
    ///
    /// Overwrites whatever was stored under the key.
    pub fn record_first(&self, fingerprint: Fingerprint, issue_id: impl Into<String>, now: DateTime<Utc>) {
        self.entries
            .insert(fingerprint, Slot::Tracked(OccurrenceRecord::first(issue_id.into(), now)));
    }

    /// Count one more occurrence of a tracked fingerprint
    ///
    /// # Errors
    /// Returns [`CacheError::NotTracked`] if there is no live record
    pub fn record_repeat(&self, fingerprint: &Fingerprint, now: DateTime<Utc>) -> Result<u32, CacheError> {
        let not_tracked = || CacheError::NotTracked(fingerprint.short());
        let Entry::Occupied(mut occupied) = self.entries.entry(*fingerprint) else {
            return Err(not_tracked());
        };
        let expired = match occupied.get_mut() {
            Slot::Tracked(record) => {
                if !self.is_expired(record.last_seen, now) {
                    return Ok(record.bump(now));
                }
                true
            }
            Slot::InFlight { .. } => false,
        };
        if expired {
            occupied.remove();
        }
        Err(not_tracked())
    }

    /// Atomic lookup-and-update used by the reporting engine
    ///
    /// Holds the shard lock only for the duration of the call. A
    /// [`Claim::First`] plants an in-flight marker so that concurrent
    /// occurrences of the same new fault do not each create an issue.
    pub fn claim(&self, fingerprint: Fingerprint, now: DateTime<Utc>) -> Claim {
        let token = self.tokens.fetch_add(1, Ordering::Relaxed);
        let marker = Slot::InFlight {
            since: now,
            token,
            pending: 0,
        };

        match self.entries.entry(fingerprint) {
            Entry::Occupied(mut occupied) => {
                match occupied.get_mut() {
                    Slot::Tracked(record) if !self.is_expired(record.last_seen, now) => {
                        let count = record.bump(now);
                        return Claim::Repeat {
                            issue_id: record.issue_id.clone(),
                            count,
                        };
                    }
                    Slot::InFlight { since, pending, .. } if !self.is_expired(*since, now) => {
                        *pending = pending.saturating_add(1);
                        return Claim::InFlight;
                    }
                    _ => {}
                }
                occupied.insert(marker);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(marker);
            }
        }

        Claim::First(InFlightGuard {
            entries: Arc::clone(&self.entries),
            fingerprint,
            token,
            done: false,
        })
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, slot| {
            let keep = !self.slot_expired(slot, now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Ownership of a pending issue creation
///
/// [`commit`](Self::commit) turns the in-flight marker into a tracked
/// record. Dropping the guard without committing removes the marker, so a
/// failed or cancelled creation leaves nothing behind.
#[derive(Debug)]
pub struct InFlightGuard {
    entries: Arc<DashMap<Fingerprint, Slot>>,
    fingerprint: Fingerprint,
    token: u64,
    done: bool,
}

impl InFlightGuard {
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Record the created issue
    ///
    /// The count starts at 1 plus every occurrence that hit the marker
    /// while creation was in flight.
    pub fn commit(mut self, issue_id: impl Into<String>, now: DateTime<Utc>) {
        let mut record = OccurrenceRecord::first(issue_id.into(), now);
        match self.entries.entry(self.fingerprint) {
            Entry::Occupied(mut occupied) => {
                let pending = match occupied.get() {
                    Slot::InFlight { token, pending, .. } if *token == self.token => *pending,
                    _ => 0,
                };
                record.count = record.count.saturating_add(pending);
                occupied.insert(Slot::Tracked(record));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Tracked(record));
            }
        }
        self.done = true;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let token = self.token;
        // Only our own marker; a newer claimer may have replaced a stale one
        self.entries.remove_if(&self.fingerprint, |_, slot| {
            matches!(slot, Slot::InFlight { token: t, .. } if *t == token)
        });
    }
}
