//! Built-in handlers

use crate::payload::WebhookPayload;
use crate::registry::WebhookHandler;
use async_trait::async_trait;

/// Logs `Issue.create` events
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueCreatedLogger;

#[async_trait]
impl WebhookHandler for IssueCreatedLogger {
    async fn handle(&self, payload: &WebhookPayload) -> anyhow::Result<()> {
        tracing::info!(
            identifier = payload.data_str("identifier").unwrap_or("?"),
            title = payload.data_str("title").unwrap_or(""),
            "issue created"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "issue-created-logger"
    }
}

/// Logs `Issue.update` events that move an issue to a completed state
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueCompletedLogger;

impl IssueCompletedLogger {
    fn is_completed(payload: &WebhookPayload) -> bool {
        payload
            .data
            .pointer("/state/type")
            .and_then(serde_json::Value::as_str)
            == Some("completed")
    }
}

#[async_trait]
impl WebhookHandler for IssueCompletedLogger {
    async fn handle(&self, payload: &WebhookPayload) -> anyhow::Result<()> {
        if Self::is_completed(payload) {
            tracing::info!(
                identifier = payload.data_str("identifier").unwrap_or("?"),
                "issue completed"
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "issue-completed-logger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(data: serde_json::Value) -> WebhookPayload {
        WebhookPayload {
            action: "update".into(),
            entity_type: "Issue".into(),
            data,
            created_at: String::new(),
            organization_id: String::new(),
            webhook_id: String::new(),
            webhook_timestamp: 0,
        }
    }

    #[test]
    fn completed_state_detection() {
        assert!(IssueCompletedLogger::is_completed(&update(
            json!({"identifier": "ENG-1", "state": {"type": "completed"}})
        )));
        assert!(!IssueCompletedLogger::is_completed(&update(
            json!({"state": {"type": "started"}})
        )));
        assert!(!IssueCompletedLogger::is_completed(&update(json!({}))));
    }

    #[tokio::test]
    async fn default_handlers_never_fail() {
        let payload = update(json!({"state": "not an object"}));
        assert!(IssueCreatedLogger.handle(&payload).await.is_ok());
        assert!(IssueCompletedLogger.handle(&payload).await.is_ok());
    }
}
