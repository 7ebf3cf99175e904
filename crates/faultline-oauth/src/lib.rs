//! OAuth 2.0 authorization-code flow with PKCE (S256)
//!
//! [`OAuthFlow::begin`] mints a verifier/state pair and returns the
//! provider authorization URL; [`OAuthFlow::complete`] consumes the state
//! from the callback and exchanges the code for a token. Pending verifiers
//! live in a [`PkceStore`] for ten minutes and can be used once.

#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod routes;
pub mod store;

pub use config::{OAuthConfig, DEFAULT_AUTHORIZE_URL, DEFAULT_SCOPES, DEFAULT_TOKEN_URL};
pub use error::OAuthError;
pub use flow::{AuthorizationRequest, OAuthFlow, TokenResponse};
pub use pkce::{generate_state, PkcePair};
pub use routes::routes;
pub use store::{PkceStore, PKCE_TTL_SECS};
