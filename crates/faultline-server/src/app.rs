//! Route assembly

use crate::config::ServiceConfig;
use faultline_oauth::{OAuthError, OAuthFlow};
use faultline_webhooks::{HandlerRegistry, SignatureVerifier, WebhookState};
use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

/// Webhook receiver state from configuration
#[must_use]
pub fn webhook_state(config: &ServiceConfig) -> WebhookState {
    let mut registry = HandlerRegistry::builder();
    if config.webhooks.default_handlers {
        registry = registry.with_default_handlers();
    }
    WebhookState::new(
        SignatureVerifier::new(config.webhooks.secret.clone()),
        registry.build(),
    )
}

/// OAuth flow from configuration
///
/// # Errors
/// Fails if the HTTP client cannot be built
pub fn oauth_flow(config: &ServiceConfig) -> Result<Arc<OAuthFlow>, OAuthError> {
    Ok(Arc::new(OAuthFlow::new(config.oauth.clone())?))
}

/// Every HTTP route the service exposes, with request tracing
pub fn routes(
    webhooks: WebhookState,
    oauth: Arc<OAuthFlow>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    faultline_webhooks::routes(webhooks)
        .or(faultline_oauth::routes(oauth))
        .unify()
        .with(warp::trace::request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_oauth::OAuthConfig;
    use serde_json::Value;
    use warp::http::StatusCode;

    fn service() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.webhooks.secret = Some("whsec".into());
        config.oauth = OAuthConfig::new()
            .with_client_id("client-1")
            .with_redirect_uri("http://localhost:8080/auth/linear/callback");
        config
    }

    fn app() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let config = service();
        routes(webhook_state(&config), oauth_flow(&config).unwrap())
    }

    #[tokio::test]
    async fn mounts_webhook_routes() {
        let res = warp::test::request()
            .path("/webhooks/linear/health")
            .reply(&app())
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["configured"], true);

        let unsigned = warp::test::request()
            .method("POST")
            .path("/webhooks/linear")
            .body("{}")
            .reply(&app())
            .await;
        assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mounts_oauth_routes() {
        let status = warp::test::request()
            .path("/auth/linear/status")
            .reply(&app())
            .await;
        let body: Value = serde_json::from_slice(status.body()).unwrap();
        assert_eq!(body["configured"], false);

        let initiate = warp::test::request().path("/auth/linear").reply(&app()).await;
        assert_eq!(initiate.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let res = warp::test::request().path("/nope").reply(&app()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn default_handlers_follow_config() {
        let mut config = service();
        assert_eq!(webhook_state(&config).registry().len(), 2);

        config.webhooks.default_handlers = false;
        assert!(webhook_state(&config).registry().is_empty());
    }
}
