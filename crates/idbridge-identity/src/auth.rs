//! OAuth2 client-credentials token source with in-memory caching.

use crate::error::{IdentityError, IdentityResult};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Slack subtracted from the reported token lifetime so a token is never
/// used right at its expiry boundary.
const EXPIRY_SLACK_SECS: u64 = 30;

/// Service credentials for the client-credentials grant.
///
/// The [`Debug`] impl redacts the secret to prevent accidental credential
/// exposure in log output.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub token_endpoint: String,
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Token response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Cached access token with expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => Instant::now() >= exp,
            None => false,
        }
    }
}

/// Bearer-token provider backed by the client-credentials grant.
///
/// Cheap to clone; the token cache is shared across clones.
#[derive(Debug, Clone)]
pub struct TokenSource {
    credentials: ClientCredentials,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    http_client: reqwest::Client,
}

impl TokenSource {
    /// Create a new token source.
    ///
    /// Rejects blank client id, secret, or token endpoint up front so a
    /// misconfigured worker fails at startup rather than on every event.
    pub fn new(
        credentials: ClientCredentials,
        http_client: reqwest::Client,
    ) -> IdentityResult<Self> {
        if credentials.client_id.trim().is_empty() {
            return Err(IdentityError::InvalidConfig(
                "client_id is empty".to_string(),
            ));
        }
        if credentials.client_secret.trim().is_empty() {
            return Err(IdentityError::InvalidConfig(
                "client_secret is empty".to_string(),
            ));
        }
        if credentials.token_endpoint.trim().is_empty() {
            return Err(IdentityError::InvalidConfig(
                "token_endpoint is empty".to_string(),
            ));
        }

        Ok(Self {
            credentials,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        })
    }

    /// Get a bearer token, fetching a fresh one if the cache is empty or
    /// the cached token is near expiry.
    pub async fn bearer_token(&self) -> IdentityResult<String> {
        {
            let cache = self.cached_token.read().await;
            if let Some(cached) = cache.as_ref() {
                if !cached.is_expired() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        debug!(
            token_endpoint = %self.credentials.token_endpoint,
            "Fetching access token"
        );

        let mut form = vec![("grant_type", "client_credentials")];
        let scope_str = self.credentials.scopes.join(" ");
        if !self.credentials.scopes.is_empty() {
            form.push(("scope", &scope_str));
        }

        let response = self
            .http_client
            .post(&self.credentials.token_endpoint)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| IdentityError::Auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(IdentityError::Auth(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Auth(format!("Failed to parse token response: {e}")))?;

        let _ = token_response.token_type; // acknowledged but unused

        let expires_at = token_response.expires_in.map(|secs| {
            Instant::now() + Duration::from_secs(secs.saturating_sub(EXPIRY_SLACK_SECS))
        });

        let access_token = token_response.access_token.clone();

        {
            let mut cache = self.cached_token.write().await;
            *cache = Some(CachedToken {
                access_token: token_response.access_token,
                expires_at,
            });
        }

        Ok(access_token)
    }

    /// Invalidate the cached token (e.g., after a 401 response).
    pub async fn invalidate(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }
}
