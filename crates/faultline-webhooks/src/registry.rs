//! Event handler registry
//!
//! Handlers are registered once through [`HandlerRegistryBuilder`] and the
//! resulting [`HandlerRegistry`] is immutable, so it can be shared across
//! request tasks behind an `Arc` without locking.

use crate::handlers::{IssueCompletedLogger, IssueCreatedLogger};
use crate::payload::{EventKey, WebhookPayload};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Reacts to a webhook event
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Handle one event; an error aborts the remaining handlers
    async fn handle(&self, payload: &WebhookPayload) -> anyhow::Result<()>;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Wrap an async closure as a [`WebhookHandler`]
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(WebhookPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnHandler(f)
}

/// Closure-backed handler, see [`handler_fn`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> WebhookHandler for FnHandler<F>
where
    F: Fn(WebhookPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, payload: &WebhookPayload) -> anyhow::Result<()> {
        (self.0)(payload.clone()).await
    }

    fn name(&self) -> &str {
        "closure"
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

/// A handler returned an error
#[derive(Debug, Error)]
#[error("handler `{handler}` for {key} failed: {source}")]
pub struct DispatchError {
    pub key: EventKey,
    pub handler: String,
    #[source]
    pub source: anyhow::Error,
}

/// Immutable map from event key to ordered handlers
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventKey, Vec<Arc<dyn WebhookHandler>>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Total number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handlers for `payload` in dispatch order: exact key, `<Type>.*`, `*`
    pub fn handlers_for<'a>(
        &'a self,
        payload: &WebhookPayload,
    ) -> impl Iterator<Item = (EventKey, &'a Arc<dyn WebhookHandler>)> + 'a {
        let exact = payload.key();
        let by_type = EventKey::any_action(&payload.entity_type);
        let any = EventKey::any();

        let mut keys = vec![exact];
        for key in [by_type, any] {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        keys.into_iter().flat_map(move |key| {
            self.handlers
                .get(&key)
                .into_iter()
                .flatten()
                .map(move |handler| (key.clone(), handler))
        })
    }

    /// Run every matching handler in order, stopping at the first error
    ///
    /// Returns the number of handlers that ran.
    pub async fn dispatch(&self, payload: &WebhookPayload) -> Result<usize, DispatchError> {
        let mut ran = 0;
        for (key, handler) in self.handlers_for(payload) {
            tracing::debug!(key = %key, handler = handler.name(), "dispatching webhook");
            handler
                .handle(payload)
                .await
                .map_err(|source| DispatchError {
                    key: key.clone(),
                    handler: handler.name().to_string(),
                    source,
                })?;
            ran += 1;
        }
        Ok(ran)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.handlers.keys().map(EventKey::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("keys", &keys)
            .field("handlers", &self.len())
            .finish()
    }
}

/// Builder for [`HandlerRegistry`]
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<EventKey, Vec<Arc<dyn WebhookHandler>>>,
}

impl HandlerRegistryBuilder {
    /// Register `handler` under `key`, after any already registered there
    #[must_use]
    pub fn on(mut self, key: impl Into<EventKey>, handler: impl WebhookHandler + 'static) -> Self {
        self.handlers
            .entry(key.into())
            .or_default()
            .push(Arc::new(handler));
        self
    }

    /// Log issue creation and completion
    #[must_use]
    pub fn with_default_handlers(self) -> Self {
        self.on("Issue.create", IssueCreatedLogger)
            .on("Issue.update", IssueCompletedLogger)
    }

    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

impl fmt::Debug for HandlerRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistryBuilder")
            .field("keys", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payload(entity_type: &str, action: &str) -> WebhookPayload {
        WebhookPayload {
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            data: json!({}),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            organization_id: "org".to_string(),
            webhook_id: "wh".to_string(),
            webhook_timestamp: 0,
        }
    }

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, tag: &'static str) -> impl WebhookHandler {
        let log = Arc::clone(log);
        handler_fn(move |_| {
            log.lock().push(tag);
            std::future::ready(Ok(()))
        })
    }

    #[tokio::test]
    async fn dispatches_exact_then_type_then_any() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::builder()
            .on("*", recorder(&log, "any"))
            .on("Issue.*", recorder(&log, "type"))
            .on("Issue.create", recorder(&log, "exact-1"))
            .on("Issue.create", recorder(&log, "exact-2"))
            .on("Comment.create", recorder(&log, "other"))
            .build();

        let ran = registry.dispatch(&payload("Issue", "create")).await.unwrap();

        assert_eq!(ran, 4);
        assert_eq!(*log.lock(), vec!["exact-1", "exact-2", "type", "any"]);
    }

    #[tokio::test]
    async fn unmatched_event_runs_nothing() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::builder()
            .on("Issue.create", recorder(&log, "exact"))
            .build();

        let ran = registry.dispatch(&payload("Cycle", "remove")).await.unwrap();
        assert_eq!(ran, 0);
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn first_error_stops_dispatch() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::builder()
            .on("Issue.update", recorder(&log, "before"))
            .on("Issue.*", handler_fn(|_| async { Err(anyhow::anyhow!("downstream unavailable")) }))
            .on("*", recorder(&log, "after"))
            .build();

        let err = registry
            .dispatch(&payload("Issue", "update"))
            .await
            .unwrap_err();

        assert_eq!(err.key.as_str(), "Issue.*");
        assert!(err.to_string().contains("downstream unavailable"));
        assert_eq!(*log.lock(), vec!["before"]);
    }

    #[test]
    fn default_handlers_cover_issue_events() {
        let registry = HandlerRegistry::builder().with_default_handlers().build();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.handlers_for(&payload("Issue", "create")).count(), 1);
        assert_eq!(registry.handlers_for(&payload("Issue", "update")).count(), 1);
        assert_eq!(registry.handlers_for(&payload("Issue", "remove")).count(), 0);
    }
}
