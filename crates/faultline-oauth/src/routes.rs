//! HTTP surface for the OAuth flow

use crate::error::OAuthError;
use crate::flow::{OAuthFlow, TokenResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `GET /auth/linear`, `GET /auth/linear/callback`, `GET /auth/linear/status`
pub fn routes(flow: Arc<OAuthFlow>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let with_flow = warp::any().map(move || Arc::clone(&flow));

    let initiate = warp::path!("auth" / "linear")
        .and(warp::get())
        .and(with_flow.clone())
        .and_then(initiate);

    let callback = warp::path!("auth" / "linear" / "callback")
        .and(warp::get())
        .and(warp::query::<CallbackQuery>())
        .and(with_flow.clone())
        .and_then(callback);

    let status = warp::path!("auth" / "linear" / "status")
        .and(warp::get())
        .and(with_flow)
        .and_then(status);

    initiate.or(callback).unify().or(status).unify()
}

async fn initiate(flow: Arc<OAuthFlow>) -> Result<Response, Infallible> {
    match flow.begin(Utc::now()) {
        Ok(request) => {
            let redirect = warp::reply::with_header(warp::reply(), "location", request.url);
            Ok(warp::reply::with_status(redirect, StatusCode::FOUND).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot start oauth flow");
            Ok(error_reply(&e))
        }
    }
}

async fn callback(query: CallbackQuery, flow: Arc<OAuthFlow>) -> Result<Response, Infallible> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "oauth authorization denied");
        return Ok(error_reply(&OAuthError::Denied(error)));
    }
    let (Some(code), Some(state)) = (query.code, query.state) else {
        return Ok(error_reply(&OAuthError::MissingParams));
    };

    match flow.complete(&code, &state, Utc::now()).await {
        Ok(token) => Ok(warp::reply::html(success_page(&token)).into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "oauth callback failed");
            Ok(error_reply(&e))
        }
    }
}

async fn status(flow: Arc<OAuthFlow>) -> Result<Response, Infallible> {
    let config = flow.config();
    let body = json!({
        "configured": config.is_configured(),
        "redirectUri": config.redirect_uri,
    });
    Ok(warp::reply::json(&body).into_response())
}

fn error_reply(error: &OAuthError) -> Response {
    let body = warp::reply::json(&json!({ "detail": error.to_string() }));
    warp::reply::with_status(body, error.status()).into_response()
}

fn success_page(token: &TokenResponse) -> String {
    let token = escape_html(&token.access_token);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Linear Auth Success</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; min-height: 100vh; background: #1a1a2e; color: white;">
  <div style="text-align: center; max-width: 600px;">
    <h1 style="color: #5e6ad2;">Linear Authentication Successful!</h1>
    <p>Access Token:</p>
    <code style="background: rgba(255,255,255,0.1); padding: 1rem; display: block; word-break: break-all;">{token}</code>
    <p style="margin-top: 1rem;">Add to your environment: LINEAR_ACCESS_TOKEN={token}</p>
  </div>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
