//! Service configuration

use faultline_core::config::{CONFIG_FILE, ENV_PREFIX};
use faultline_core::FaultlineConfig;
use faultline_oauth::OAuthConfig;
use faultline_webhooks::WebhookConfig;
use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Default bind address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Settings for the HTTP surfaces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    pub webhooks: WebhookConfig,
    pub oauth: OAuthConfig,
}

/// Engine and service configuration read from the same sources
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub engine: FaultlineConfig,
    pub service: ServiceConfig,
}

impl AppConfig {
    /// Load from `faultline.toml` and the environment
    ///
    /// # Errors
    /// Fails if a source holds invalid values
    pub fn load() -> Result<Self, figment::Error> {
        Self::from_file(CONFIG_FILE)
    }

    /// Load with a specific TOML file
    ///
    /// # Errors
    /// Fails if a source holds invalid values
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        let figment = Self::figment(path);
        Ok(Self {
            engine: figment.extract()?,
            service: figment.extract()?,
        })
    }

    /// Engine providers plus the service's legacy variables, with
    /// `FAULTLINE_` overrides still applied last
    #[must_use]
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        FaultlineConfig::figment(path)
            .merge(legacy_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

fn legacy_env() -> Env {
    Env::raw().filter_map(|key| legacy_key(key.as_str()).map(Into::into))
}

fn legacy_key(name: &str) -> Option<&'static str> {
    match name.to_ascii_uppercase().as_str() {
        "LINEAR_WEBHOOK_SECRET" => Some("webhooks.secret"),
        "LINEAR_CLIENT_ID" => Some("oauth.client_id"),
        "LINEAR_CLIENT_SECRET" => Some("oauth.client_secret"),
        "LINEAR_REDIRECT_URI" => Some("oauth.redirect_uri"),
        _ => None,
    }
}
