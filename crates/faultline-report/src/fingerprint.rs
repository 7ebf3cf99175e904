//! Fault fingerprinting
//!
//! A [`Fingerprint`] identifies "the same underlying fault" for dedup
//! purposes. It covers the message and the first stack line only, so the
//! same failure raised for different users or URLs folds into one issue.

use crate::report::FaultReport;
use std::fmt::{self, Display, Formatter};

/// Separator between message and stack head in the hashed input
const DELIMITER: &[u8] = b":";

/// A 32-byte fault fingerprint (Blake3)
///
/// Unkeyed, so identical faults hash identically across process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a report
    #[inline]
    #[must_use]
    pub fn of(report: &FaultReport) -> Self {
        Self::compute(report.message(), Some(report.stack_head()))
    }

    /// Fingerprint a message and an optional stack
    ///
    /// Only the first line of `stack` participates.
    #[must_use]
    pub fn compute(message: &str, stack: Option<&str>) -> Self {
        let head = stack.and_then(|s| s.split('\n').next()).unwrap_or("");
        let mut hasher = blake3::Hasher::new();
        hasher.update(message.as_bytes());
        hasher.update(DELIMITER);
        hasher.update(head.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Wrap raw digest bytes
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
