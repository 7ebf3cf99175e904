//! Fault dedup cache
//!
//! Tracks which fingerprints already have an open issue, and how often
//! they recurred, inside a sliding time window.
//!
//! Expiry is lazy: an entry older than the window is evicted the next
//! time it is read. [`DedupCache::purge_expired`] is available for
//! callers that also want a periodic sweep.

#![allow(missing_docs)]

pub mod clock;
pub mod dedup;
pub mod error;

pub use clock::{Clock, SystemClock};
pub use dedup::{Claim, DedupCache, InFlightGuard, OccurrenceRecord, DEFAULT_WINDOW_SECS};
pub use error::CacheError;
