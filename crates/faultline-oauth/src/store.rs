//! Pending authorization store

use crate::error::OAuthError;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// How long a pending authorization stays valid
pub const PKCE_TTL_SECS: i64 = 600;

#[derive(Debug, Clone)]
struct Pending {
    verifier: String,
    expires_at: DateTime<Utc>,
}

/// Verifiers keyed by state, each usable once
#[derive(Debug, Clone)]
pub struct PkceStore {
    entries: Arc<DashMap<String, Pending>>,
    ttl: TimeDelta,
}

impl PkceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(TimeDelta::seconds(PKCE_TTL_SECS))
    }

    #[must_use]
    pub fn with_ttl(ttl: TimeDelta) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn insert(&self, state: impl Into<String>, verifier: impl Into<String>, now: DateTime<Utc>) {
        self.entries.insert(
            state.into(),
            Pending {
                verifier: verifier.into(),
                expires_at: now + self.ttl,
            },
        );
    }

    /// Remove and return the verifier for `state`
    ///
    /// # Errors
    ///
    /// `InvalidState` for an unknown state, `Expired` once past the TTL.
    /// The entry is gone afterwards in both cases.
    pub fn take(&self, state: &str, now: DateTime<Utc>) -> Result<String, OAuthError> {
        let (_, pending) = self.entries.remove(state).ok_or(OAuthError::InvalidState)?;
        if pending.expires_at < now {
            return Err(OAuthError::Expired);
        }
        Ok(pending.verifier)
    }

    /// Drop expired entries, returning how many were removed
    pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, pending| pending.expires_at >= now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "purged expired oauth states");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PkceStore {
    fn default() -> Self {
        Self::new()
    }
}
