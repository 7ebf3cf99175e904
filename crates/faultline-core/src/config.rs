//! Configuration for the reporting engine

use crate::error::CoreError;
use chrono::TimeDelta;
use faultline_cache::DEFAULT_WINDOW_SECS;
use faultline_tracker::{TrackerConfig, DEFAULT_TIMEOUT_SECS};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file, looked up in the working directory
pub const CONFIG_FILE: &str = "faultline.toml";

/// Prefix for structured environment overrides (`FAULTLINE_TRACKER__API_KEY`)
pub const ENV_PREFIX: &str = "FAULTLINE_";

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultlineConfig {
    /// Tracker credentials and endpoint
    pub tracker: TrackerConfig,
    /// Issue text and result settings
    pub reporter: ReporterSettings,
    /// Dedup window settings
    pub dedup: DedupSettings,
}

impl FaultlineConfig {
    /// Load configuration from the default sources.
    ///
    /// Later sources override earlier ones:
    /// 1. Default values
    /// 2. `faultline.toml` in the current directory (if present)
    /// 3. Legacy variables (`LINEAR_API_KEY`, `LINEAR_DEFAULT_TEAM_ID`,
    ///    `LINEAR_APP_NAME`, `ENVIRONMENT`)
    /// 4. `FAULTLINE_` prefixed variables, nested with `__`
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if a source holds invalid values
    pub fn load() -> Result<Self, CoreError> {
        Self::from_file(CONFIG_FILE)
    }

    /// Load configuration with a specific TOML file
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if a source holds invalid values
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would crash the engine or silently disable it
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for a non-positive or out-of-range
    /// dedup window, or a zero tracker timeout
    pub fn validate(&self) -> Result<(), CoreError> {
        self.dedup.window()?;
        if self.reporter.call_timeout_secs == 0 {
            return Err(CoreError::Config(
                "reporter.call_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.tracker.timeout_secs == 0 {
            return Err(CoreError::Config(
                "tracker.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Layered provider stack, for callers embedding this config
    #[must_use]
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(legacy_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// With tracker settings
    #[inline]
    #[must_use]
    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    /// With reporter settings
    #[inline]
    #[must_use]
    pub fn with_reporter(mut self, reporter: ReporterSettings) -> Self {
        self.reporter = reporter;
        self
    }
}

/// Unprefixed variable names kept for existing deployments
fn legacy_env() -> Env {
    Env::raw().filter_map(|key| legacy_key(key.as_str()).map(Into::into))
}

fn legacy_key(name: &str) -> Option<&'static str> {
    match name.to_ascii_uppercase().as_str() {
        "LINEAR_API_KEY" => Some("tracker.api_key"),
        "LINEAR_DEFAULT_TEAM_ID" => Some("tracker.team_id"),
        "LINEAR_APP_NAME" => Some("reporter.app_name"),
        "ENVIRONMENT" => Some("reporter.environment"),
        _ => None,
    }
}

/// Issue text and result settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterSettings {
    /// Application name placed in issue titles
    pub app_name: String,
    /// Deployment environment shown in issue bodies
    pub environment: String,
    /// Base for the URL synthesized on duplicate results
    pub duplicate_url_base: String,
    /// Upper bound for a single tracker call, in seconds
    pub call_timeout_secs: u64,
}

impl ReporterSettings {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With application name
    #[inline]
    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// With environment label
    #[inline]
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// With tracker call timeout
    #[inline]
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_secs = timeout.as_secs().max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self {
            app_name: "Application".to_string(),
            environment: "production".to_string(),
            duplicate_url_base: "https://linear.app/issue".to_string(),
            call_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Dedup window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    /// Window during which repeats fold into one issue, in seconds
    pub window_secs: i64,
}

impl DedupSettings {
    /// Window as a duration
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] unless the window is positive and
    /// representable
    pub fn window(&self) -> Result<TimeDelta, CoreError> {
        if self.window_secs <= 0 {
            return Err(CoreError::Config(format!(
                "dedup.window_secs must be positive, got {}",
                self.window_secs
            )));
        }
        TimeDelta::try_seconds(self.window_secs).ok_or_else(|| {
            CoreError::Config(format!(
                "dedup.window_secs {} is out of range",
                self.window_secs
            ))
        })
    }
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = FaultlineConfig::default();
        assert!(!config.tracker.is_configured());
        assert_eq!(config.reporter.app_name, "Application");
        assert_eq!(config.reporter.environment, "production");
        assert_eq!(config.dedup.window_secs, 3600);
        assert_eq!(config.reporter.call_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn loads_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "faultline.toml",
                r#"
                [tracker]
                api_key = "lin_file"
                team_id = "team-file"

                [reporter]
                app_name = "Billing"

                [dedup]
                window_secs = 600
                "#,
            )?;

            let config = FaultlineConfig::load().map_err(|e| e.to_string())?;
            assert!(config.tracker.is_configured());
            assert_eq!(config.reporter.app_name, "Billing");
            assert_eq!(config.reporter.environment, "production");
            assert_eq!(config.dedup.window_secs, 600);
            Ok(())
        });
    }

    #[test]
    fn legacy_env_names_are_honoured() {
        Jail::expect_with(|jail| {
            jail.set_env("LINEAR_API_KEY", "lin_env");
            jail.set_env("LINEAR_DEFAULT_TEAM_ID", "team-env");
            jail.set_env("LINEAR_APP_NAME", "Storefront");
            jail.set_env("ENVIRONMENT", "staging");

            let config = FaultlineConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.tracker.api_key.as_deref(), Some("lin_env"));
            assert_eq!(config.tracker.team_id.as_deref(), Some("team-env"));
            assert_eq!(config.reporter.app_name, "Storefront");
            assert_eq!(config.reporter.environment, "staging");
            Ok(())
        });
    }

    #[test]
    fn prefixed_env_overrides_file_and_legacy() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "faultline.toml",
                r#"
                [reporter]
                app_name = "FromFile"
                "#,
            )?;
            jail.set_env("LINEAR_APP_NAME", "FromLegacy");
            jail.set_env("FAULTLINE_REPORTER__APP_NAME", "FromPrefixed");

            let config = FaultlineConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.reporter.app_name, "FromPrefixed");
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_config_errors() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[dedup]\nwindow_secs = \"soon\"\n")?;
            let err = FaultlineConfig::from_file("bad.toml").unwrap_err();
            assert!(matches!(err, CoreError::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn from_file_reads_any_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporting.toml");
        std::fs::write(
            &path,
            "[reporter]\nenvironment = \"canary\"\ncall_timeout_secs = 3\n",
        )
        .unwrap();

        let config = FaultlineConfig::from_file(&path).unwrap();
        assert_eq!(config.reporter.call_timeout(), Duration::from_secs(3));
        assert!(FaultlineConfig::from_file(dir.path().join("missing.toml")).is_ok());
    }

    #[test]
    fn window_must_be_positive_and_in_range() {
        for bad in [0, -1, i64::MAX] {
            let settings = DedupSettings { window_secs: bad };
            assert!(matches!(settings.window(), Err(CoreError::Config(_))), "{bad}");
        }
        let settings = DedupSettings { window_secs: 90 };
        assert_eq!(settings.window().unwrap(), TimeDelta::seconds(90));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut config = FaultlineConfig::default();
        assert!(config.validate().is_ok());

        config.reporter.call_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        config.reporter.call_timeout_secs = 5;
        config.tracker.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn loading_validates_values() {
        Jail::expect_with(|jail| {
            jail.create_file("negative.toml", "[dedup]\nwindow_secs = -1\n")?;
            jail.create_file("huge.toml", &format!("[dedup]\nwindow_secs = {}\n", i64::MAX))?;
            jail.create_file("zero.toml", "[reporter]\ncall_timeout_secs = 0\n")?;

            for file in ["negative.toml", "huge.toml", "zero.toml"] {
                let err = FaultlineConfig::from_file(file).unwrap_err();
                assert!(matches!(err, CoreError::Config(_)), "{file}");
            }

            jail.set_env("FAULTLINE_TRACKER__TIMEOUT_SECS", "0");
            assert!(FaultlineConfig::load().is_err());
            Ok(())
        });
    }
}
