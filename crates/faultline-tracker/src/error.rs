//! Error types for tracker calls

use std::time::Duration;

/// Tracker call failure
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Credential or target project missing
    #[error("tracker not configured: {0} missing")]
    NotConfigured(&'static str),

    /// Transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("tracker returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// GraphQL-level errors in a 200 response
    #[error("graphql error: {0}")]
    GraphQl(String),

    /// Mutation reported `success: false`
    #[error("tracker rejected {0}")]
    Rejected(&'static str),

    /// Response body did not have the expected shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Call did not finish in time
    #[error("tracker call timed out after {0:?}")]
    Timeout(Duration),
}

impl TrackerError {
    /// Configuration problem rather than a tracker outage
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TrackerError::NotConfigured("api_key").to_string(),
            "tracker not configured: api_key missing"
        );
        let status = TrackerError::Status {
            status: 401,
            body: "unauthorized".into(),
        };
        assert!(status.to_string().contains("401"));
    }

    #[test]
    fn classifies_configuration_errors() {
        assert!(TrackerError::NotConfigured("team_id").is_configuration());
        assert!(!TrackerError::Rejected("issueCreate").is_configuration());
    }
}
