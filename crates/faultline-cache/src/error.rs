//! Error types for the dedup cache

/// Dedup cache errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// No live record for the fingerprint
    #[error("fingerprint {0} is not tracked")]
    NotTracked(String),
}
