//! Client-credentials access tokens with caching.

use crate::{ClientConfig, ClientError, ClientResult};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Fetches and caches bearer tokens from `{auth_url}/oauth/token`.
#[derive(Debug, Clone)]
pub struct TokenSource {
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cached: Arc<RwLock<Option<CachedToken>>>,
    http: reqwest::Client,
}

impl TokenSource {
    pub fn new(config: &ClientConfig, http: reqwest::Client) -> Self {
        Self {
            token_url: format!("{}/oauth/token", config.auth_url.trim_end_matches('/')),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.effective_scopes().join(" "),
            cached: Arc::new(RwLock::new(None)),
            http,
        }
    }

    /// A valid bearer token, fetched when none is cached or it expired.
    pub async fn token(&self) -> ClientResult<String> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if !cached.is_expired() {
                return Ok(cached.access_token.clone());
            }
        }

        debug!(url = %self.token_url, "fetching access token");
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", self.scope.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ClientError::AuthFailed(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::AuthFailed(format!("unreadable token response: {e}")))?;
        // Refresh a little before the server-side expiry.
        let expires_at = token
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(secs.saturating_sub(60)));

        *self.cached.write().await = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    /// Drops the cached token, e.g. after a 401.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}
