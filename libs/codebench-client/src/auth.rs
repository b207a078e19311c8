/// Bearer credentials for outbound calls
///
/// Tokens are minted by an external identity provider. This module only
/// holds them and keeps them fresh: before every call the provider is asked
/// for a token, and an access token close to expiry is refreshed first.
/// When a refresh fails the caller must log in again; no request goes out
/// without the credential it was supposed to carry.
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use codebench_common::config::AuthConfig;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("login required: {0}")]
    LoginRequired(String),
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Token to attach, or `None` for anonymous calls
    async fn bearer_token(&self) -> Result<Option<String>, AuthError>;
}

/// No credential; only public routes will succeed
pub struct Anonymous;

#[async_trait]
impl CredentialProvider for Anonymous {
    async fn bearer_token(&self) -> Result<Option<String>, AuthError> {
        Ok(None)
    }
}

/// A token handed over as-is, never refreshed
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn bearer_token(&self) -> Result<Option<String>, AuthError> {
        Ok(Some(self.0.clone()))
    }
}

#[derive(Debug)]
struct TokenState {
    access_token: Option<String>,
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// OpenID Connect refresh-token flow against the identity provider
pub struct OidcCredentials {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    min_validity: Duration,
    state: Mutex<TokenState>,
}

impl OidcCredentials {
    pub fn new(http: reqwest::Client, config: &AuthConfig, refresh_token: impl Into<String>) -> Self {
        let access_token = config.access_token.clone();
        let expires_at = access_token.as_deref().and_then(jwt_expiry);
        Self {
            http,
            token_endpoint: config.token_endpoint(),
            client_id: config.client_id.clone(),
            min_validity: Duration::from_std(config.min_validity).unwrap_or_else(|_| Duration::seconds(30)),
            state: Mutex::new(TokenState {
                access_token,
                refresh_token: refresh_token.into(),
                expires_at,
            }),
        }
    }

    async fn refresh(&self, state: &mut TokenState) -> Result<(), AuthError> {
        debug!(endpoint = %self.token_endpoint, "Refreshing access token");

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", state.refresh_token.as_str()),
        ];
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Token refresh request failed");
                AuthError::LoginRequired(format!("token refresh failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Identity provider rejected refresh token");
            state.access_token = None;
            return Err(AuthError::LoginRequired(format!(
                "token refresh rejected with status {}",
                status.as_u16()
            )));
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Malformed token response");
            AuthError::LoginRequired(format!("malformed token response: {}", e))
        })?;

        let now = Utc::now();
        state.expires_at = tokens
            .expires_in
            .map(|secs| now + Duration::seconds(secs))
            .or_else(|| jwt_expiry(&tokens.access_token));
        state.access_token = Some(tokens.access_token);
        if let Some(refresh_token) = tokens.refresh_token {
            state.refresh_token = refresh_token;
        }

        info!(expires_at = ?state.expires_at, "Access token refreshed");
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for OidcCredentials {
    async fn bearer_token(&self) -> Result<Option<String>, AuthError> {
        let mut state = self.state.lock().await;
        if needs_refresh(state.access_token.is_some(), state.expires_at, Utc::now(), self.min_validity) {
            self.refresh(&mut state).await?;
        }
        Ok(state.access_token.clone())
    }
}

/// Pick a provider from configuration: refresh token, then static token, then anonymous
pub fn credentials_from_config(http: reqwest::Client, config: &AuthConfig) -> Arc<dyn CredentialProvider> {
    match (&config.refresh_token, &config.access_token) {
        (Some(refresh_token), _) => Arc::new(OidcCredentials::new(http, config, refresh_token.clone())),
        (None, Some(token)) => Arc::new(StaticToken::new(token.clone())),
        (None, None) => Arc::new(Anonymous),
    }
}

fn needs_refresh(
    has_token: bool,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_validity: Duration,
) -> bool {
    match (has_token, expires_at) {
        (false, _) | (true, None) => true,
        (true, Some(expires_at)) => expires_at - now < min_validity,
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// `exp` claim of a JWT, without verifying the signature
fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}
