//! Authorization-code flow

use crate::config::OAuthConfig;
use crate::error::OAuthError;
use crate::pkce::{generate_state, PkcePair};
use crate::store::PkceStore;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TOKEN_TIMEOUT_SECS: u64 = 10;

/// Where to send the browser, and the state that will come back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Token endpoint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// OAuth client: configuration, pending states and an HTTP client
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    config: OAuthConfig,
    store: PkceStore,
    http: Client,
}

impl OAuthFlow {
    /// # Errors
    /// Returns [`OAuthError::Http`] if the HTTP client cannot be built
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(TOKEN_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            config,
            store: PkceStore::new(),
            http,
        })
    }

    #[inline]
    #[must_use]
    pub fn with_store(mut self, store: PkceStore) -> Self {
        self.store = store;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &PkceStore {
        &self.store
    }

    /// Start an authorization, remembering its verifier under a new state
    ///
    /// # Errors
    /// `NotConfigured` without a client id, `InvalidUrl` when the
    /// authorize URL does not parse
    pub fn begin(&self, now: DateTime<Utc>) -> Result<AuthorizationRequest, OAuthError> {
        let client_id = self
            .config
            .client_id()
            .ok_or(OAuthError::NotConfigured("client_id"))?;

        let pkce = PkcePair::generate();
        let state = generate_state();

        let scope = self.config.scope_param();
        let mut params = vec![("client_id", client_id)];
        if let Some(redirect_uri) = self.config.redirect_uri.as_deref() {
            params.push(("redirect_uri", redirect_uri));
        }
        params.extend([
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
            ("code_challenge", pkce.challenge.as_str()),
            ("code_challenge_method", "S256"),
        ]);

        let url = Url::parse_with_params(&self.config.authorize_url, &params)
            .map_err(|e| OAuthError::InvalidUrl(e.to_string()))?;

        self.store.insert(state.clone(), pkce.verifier, now);
        self.store.cleanup_expired(now);
        tracing::debug!(pending = self.store.len(), "oauth authorization started");

        Ok(AuthorizationRequest {
            url: url.into(),
            state,
        })
    }

    /// Finish an authorization: consume `state` and exchange `code`
    ///
    /// # Errors
    /// `InvalidState`/`Expired` from the store, `NotConfigured` without
    /// client credentials, `Http`/`TokenExchange` when the token endpoint
    /// fails
    pub async fn complete(
        &self,
        code: &str,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenResponse, OAuthError> {
        let verifier = self.store.take(state, now)?;

        let client_id = self
            .config
            .client_id()
            .ok_or(OAuthError::NotConfigured("client_id"))?;
        let client_secret = self
            .config
            .client_secret()
            .ok_or(OAuthError::NotConfigured("client_secret"))?;
        let redirect_uri = self.config.redirect_uri.as_deref().unwrap_or_default();

        let form = [
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "authorization_code"),
            ("code_verifier", verifier.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "oauth token exchange rejected");
            return Err(OAuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!("oauth token exchange succeeded");
        Ok(token)
    }
}
