//! Tracker configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear GraphQL endpoint
pub const DEFAULT_API_URL: &str = "https://api.linear.app/graphql";

/// Per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Credentials and target for the tracker client
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// API credential
    pub api_key: Option<String>,
    /// Team issues are filed under
    pub team_id: Option<String>,
    /// GraphQL endpoint
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TrackerConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API credential
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// With target team
    #[inline]
    #[must_use]
    pub fn with_team_id(mut self, team: impl Into<String>) -> Self {
        self.team_id = Some(team.into());
        self
    }

    /// With GraphQL endpoint
    #[inline]
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Both credential and team present (blank values count as missing)
    #[must_use]
    pub fn is_configured(&self) -> bool {
        present(self.api_key.as_deref()) && present(self.team_id.as_deref())
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            team_id: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("team_id", &self.team_id)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_both_key_and_team() {
        assert!(!TrackerConfig::new().is_configured());
        assert!(!TrackerConfig::new().with_api_key("k").is_configured());
        assert!(!TrackerConfig::new().with_team_id("t").is_configured());
        assert!(!TrackerConfig::new().with_api_key(" ").with_team_id("t").is_configured());
        assert!(TrackerConfig::new().with_api_key("k").with_team_id("t").is_configured());
    }

    #[test]
    fn debug_redacts_key() {
        let config = TrackerConfig::new().with_api_key("lin_secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("lin_secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn defaults_point_at_linear() {
        let config = TrackerConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
