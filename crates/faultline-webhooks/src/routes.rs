//! HTTP surface for the webhook receiver

use crate::payload::WebhookPayload;
use crate::registry::HandlerRegistry;
use crate::signature::SignatureVerifier;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Header carrying the hex HMAC of the body
pub const SIGNATURE_HEADER: &str = "linear-signature";

const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Shared receiver state
#[derive(Debug, Clone)]
pub struct WebhookState {
    verifier: SignatureVerifier,
    registry: HandlerRegistry,
}

impl WebhookState {
    #[must_use]
    pub fn new(verifier: SignatureVerifier, registry: HandlerRegistry) -> Self {
        Self { verifier, registry }
    }

    #[must_use]
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }
}

/// `POST /webhooks/linear` and `GET /webhooks/linear/health`
pub fn routes(state: WebhookState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let state = Arc::new(state);
    let with_state = warp::any().map(move || Arc::clone(&state));

    let receive = warp::path!("webhooks" / "linear")
        .and(warp::post())
        .and(warp::header::optional::<String>(SIGNATURE_HEADER))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_state.clone())
        .and_then(receive);

    let health = warp::path!("webhooks" / "linear" / "health")
        .and(warp::get())
        .and(with_state)
        .and_then(health);

    receive.or(health).unify()
}

async fn receive(
    signature: Option<String>,
    body: Bytes,
    state: Arc<WebhookState>,
) -> Result<Response, Infallible> {
    if !state.verifier.verify(&body, signature.as_deref()) {
        tracing::warn!("rejected webhook with invalid signature");
        return Ok(detail(StatusCode::UNAUTHORIZED, "Invalid webhook signature"));
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "rejected malformed webhook payload");
            return Ok(detail(StatusCode::BAD_REQUEST, &format!("Invalid payload: {e}")));
        }
    };

    tracing::info!(
        event = %payload.key(),
        webhook = %payload.webhook_id,
        "webhook received"
    );

    match state.registry.dispatch(&payload).await {
        Ok(_) => Ok(warp::reply::json(&json!({ "success": true })).into_response()),
        Err(e) => {
            tracing::error!(error = %e, "webhook processing failed");
            Ok(detail(StatusCode::INTERNAL_SERVER_ERROR, "Processing failed"))
        }
    }
}

async fn health(state: Arc<WebhookState>) -> Result<Response, Infallible> {
    let body = json!({
        "status": "ok",
        "configured": state.verifier.is_configured(),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    });
    Ok(warp::reply::json(&body).into_response())
}

fn detail(status: StatusCode, detail: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "detail": detail })), status)
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::handler_fn;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    const SECRET: &str = "whsec_test";

    fn body() -> String {
        json!({
            "action": "create",
            "type": "Issue",
            "data": {"identifier": "ENG-7", "title": "Checkout fails"},
            "createdAt": "2024-01-01T00:00:00.000Z",
            "organizationId": "org-1",
            "webhookId": "wh-1",
            "webhookTimestamp": 1_704_067_200_000_i64
        })
        .to_string()
    }

    fn state(secret: Option<&str>, registry: HandlerRegistry) -> WebhookState {
        WebhookState::new(SignatureVerifier::new(secret.map(str::to_string)), registry)
    }

    fn signed(body: &str) -> String {
        SignatureVerifier::new(Some(SECRET.into()))
            .sign(body.as_bytes())
            .unwrap()
    }

    fn json_body(res: &warp::http::Response<Bytes>) -> Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[tokio::test]
    async fn accepts_signed_payload() {
        let filter = routes(state(
            Some(SECRET),
            HandlerRegistry::builder().with_default_handlers().build(),
        ));
        let body = body();

        let res = warp::test::request()
            .method("POST")
            .path("/webhooks/linear")
            .header(SIGNATURE_HEADER, signed(&body))
            .body(&body)
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(&res), json!({"success": true}));
    }

    #[tokio::test]
    async fn rejects_bad_or_missing_signature() {
        let filter = routes(state(Some(SECRET), HandlerRegistry::default()));
        let body = body();

        let missing = warp::test::request()
            .method("POST")
            .path("/webhooks/linear")
            .body(&body)
            .reply(&filter)
            .await;
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = warp::test::request()
            .method("POST")
            .path("/webhooks/linear")
            .header(SIGNATURE_HEADER, signed("{}"))
            .body(&body)
            .reply(&filter)
            .await;
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unsigned_accepted_without_secret() {
        let filter = routes(state(None, HandlerRegistry::default()));

        let res = warp::test::request()
            .method("POST")
            .path("/webhooks/linear")
            .body(body())
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_payload_is_bad_request() {
        let filter = routes(state(None, HandlerRegistry::default()));

        let res = warp::test::request()
            .method("POST")
            .path("/webhooks/linear")
            .body(r#"{"action":"create"}"#)
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let detail = json_body(&res)["detail"].as_str().unwrap().to_string();
        assert!(detail.starts_with("Invalid payload"));
    }

    #[tokio::test]
    async fn handler_failure_is_server_error() {
        let registry = HandlerRegistry::builder()
            .on("*", handler_fn(|_| async { Err(anyhow::anyhow!("boom")) }))
            .build();
        let filter = routes(state(None, registry));

        let res = warp::test::request()
            .method("POST")
            .path("/webhooks/linear")
            .body(body())
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&res), json!({"detail": "Processing failed"}));
    }

    #[tokio::test]
    async fn health_reports_configuration() {
        let filter = routes(state(Some(SECRET), HandlerRegistry::default()));

        let res = warp::test::request()
            .method("GET")
            .path("/webhooks/linear/health")
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(&res);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["configured"], true);
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
