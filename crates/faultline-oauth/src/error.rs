//! OAuth errors

use warp::http::StatusCode;

/// OAuth flow failure
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Client credential or endpoint missing
    #[error("oauth not configured: {0} missing")]
    NotConfigured(&'static str),

    /// The provider redirected back with an error
    #[error("authorization failed: {0}")]
    Denied(String),

    /// Callback without `code` or `state`
    #[error("missing code or state")]
    MissingParams,

    /// Unknown or already used state
    #[error("invalid or expired state")]
    InvalidState,

    /// State older than the store TTL
    #[error("session expired")]
    Expired,

    /// Authorization URL could not be built
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Transport failure talking to the token endpoint
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token endpoint refused the exchange
    #[error("token exchange failed with {status}: {body}")]
    TokenExchange { status: u16, body: String },
}

impl OAuthError {
    /// HTTP status reported to the browser
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Denied(_) | Self::MissingParams | Self::InvalidState | Self::Expired => {
                StatusCode::BAD_REQUEST
            }
            Self::NotConfigured(_)
            | Self::InvalidUrl(_)
            | Self::Http(_)
            | Self::TokenExchange { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
