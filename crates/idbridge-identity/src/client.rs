//! HTTP client for resolving user profiles (reqwest-based).

use crate::auth::TokenSource;
use crate::error::{IdentityError, IdentityResult};
use crate::profile::{RawProfile, ResolvedProfile};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the identity service's user endpoint.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    /// Base URL of the identity API (e.g., "http://localhost:8881/api").
    base_url: String,
    /// Path template for the user endpoint; `{}` is replaced with the
    /// path-escaped external identifier.
    user_path_template: String,
    /// Token source for bearer auth.
    auth: TokenSource,
    /// Underlying HTTP client.
    http_client: Client,
}

impl IdentityClient {
    /// Create a new identity client with a bounded per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        user_path_template: impl Into<String>,
        auth: TokenSource,
        timeout: Duration,
    ) -> IdentityResult<Self> {
        let http_client = Client::builder().timeout(timeout).build().map_err(|e| {
            IdentityError::InvalidConfig(format!("Failed to build HTTP client: {e}"))
        })?;

        Self::with_http_client(base_url, user_path_template, auth, http_client)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_http_client(
        base_url: impl Into<String>,
        user_path_template: impl Into<String>,
        auth: TokenSource,
        http_client: Client,
    ) -> IdentityResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(IdentityError::InvalidConfig("base_url is empty".to_string()));
        }

        let user_path_template = user_path_template.into();
        if !user_path_template.contains("{}") {
            return Err(IdentityError::InvalidConfig(format!(
                "user_path_template '{user_path_template}' has no {{}} placeholder"
            )));
        }

        Ok(Self {
            base_url,
            user_path_template,
            auth,
            http_client,
        })
    }

    /// Build the profile URL for an external identifier.
    fn user_url(&self, external_id: &str) -> String {
        let escaped = urlencoding::encode(external_id);
        let path = self.user_path_template.replacen("{}", &escaped, 1);
        format!("{}{}", self.base_url, path)
    }

    /// Resolve an external identifier into a full profile.
    ///
    /// Returns `Ok(None)` when the identity service answers 404 — an
    /// informational skip, not an error. Field defaults from
    /// [`crate::profile`] are applied to the success body.
    pub async fn resolve(&self, external_id: &str) -> IdentityResult<Option<ResolvedProfile>> {
        let token = self.auth.bearer_token().await?;
        let url = self.user_url(external_id);

        debug!(url = %url, "Fetching user profile from identity service");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(external_id, url = %url, "User not found on identity service");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(IdentityError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let raw: RawProfile = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        Ok(Some(ResolvedProfile::from_raw(raw, external_id)))
    }
}
