//! Error types for Faultline Core
//!
//! Only setup can fail: loading configuration and building the tracker
//! client. Reporting itself never returns an error.

use faultline_tracker::TrackerError;

/// Setup errors
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Configuration could not be loaded or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Tracker client could not be built
    #[error("tracker setup failed: {0}")]
    Tracker(#[from] TrackerError),
}

impl From<figment::Error> for CoreError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = CoreError::Config("missing field".to_string());
        assert!(err.to_string().contains("configuration error"));

        let err = CoreError::from(TrackerError::NotConfigured("api_key"));
        assert!(err.to_string().contains("api_key"));
    }
}
