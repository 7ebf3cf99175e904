//! Webhook payload model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Event delivered by the tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// `create`, `update` or `remove`
    pub action: String,
    /// Entity type: `Issue`, `Comment`, `Project`, `Cycle`, ...
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Entity snapshot
    pub data: Value,
    pub created_at: String,
    pub organization_id: String,
    pub webhook_id: String,
    /// Delivery time, milliseconds since the epoch
    pub webhook_timestamp: i64,
}

impl WebhookPayload {
    /// `"<Type>.<action>"`
    #[inline]
    #[must_use]
    pub fn key(&self) -> EventKey {
        EventKey::new(&self.entity_type, &self.action)
    }

    /// String field of `data`, if present
    #[must_use]
    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Handler registration key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey(String);

impl EventKey {
    /// Matches every event
    pub const WILDCARD: &'static str = "*";

    /// Specific `<Type>.<action>` key
    #[must_use]
    pub fn new(entity_type: &str, action: &str) -> Self {
        Self(format!("{entity_type}.{action}"))
    }

    /// `<Type>.*` key
    #[must_use]
    pub fn any_action(entity_type: &str) -> Self {
        Self::new(entity_type, Self::WILDCARD)
    }

    /// `*` key
    #[must_use]
    pub fn any() -> Self {
        Self(Self::WILDCARD.to_string())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl Display for EventKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
