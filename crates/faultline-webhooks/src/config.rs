//! Webhook receiver configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Webhook receiver settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared signing secret; without one signatures are not checked
    pub secret: Option<String>,
    /// Register the built-in logging handlers
    pub default_handlers: bool,
}

impl WebhookConfig {
    /// Whether a non-blank secret is set
    #[must_use]
    pub fn has_secret(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            default_handlers: true,
        }
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("default_handlers", &self.default_handlers)
            .finish()
    }
}
