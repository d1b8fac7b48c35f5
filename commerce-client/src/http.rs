//! reqwest implementation of [`CommerceApi`].

use crate::auth::TokenSource;
use crate::{ClientConfig, ClientError, ClientResult, CommerceApi};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Error body returned by the commerce API.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEntry {
    #[serde(default)]
    detailed_error_message: Option<String>,
}

/// HTTP client for one project of the commerce API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    project_url: String,
    http: Client,
    auth: TokenSource,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("commerce-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(config, http))
    }

    /// Creates a client around a pre-built `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(config: &ClientConfig, http: Client) -> Self {
        Self {
            project_url: format!(
                "{}/{}",
                config.api_url.trim_end_matches('/'),
                config.project_key
            ),
            auth: TokenSource::new(config, http.clone()),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.project_url.clone()
        } else {
            format!("{}/{}", self.project_url, path.trim_start_matches('/'))
        }
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> ClientResult<Value> {
        let token = self.auth.token().await?;
        let response = builder.bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()));
        }

        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let detailed = parsed
            .errors
            .into_iter()
            .find_map(|e| e.detailed_error_message);
        let message = if parsed.message.is_empty() { body } else { parsed.message };
        warn!(status = status.as_u16(), path, %message, "commerce API call failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
            detailed,
        })
    }
}

#[async_trait]
impl CommerceApi for HttpClient {
    async fn create(&self, endpoint: &str, draft: Value) -> ClientResult<Value> {
        debug!(endpoint, "POST draft");
        self.send(endpoint, self.http.post(self.url(endpoint)).json(&draft))
            .await
    }

    async fn get(&self, path: &str) -> ClientResult<Value> {
        debug!(path, "GET");
        self.send(path, self.http.get(self.url(path))).await
    }

    async fn update(&self, path: &str, version: i64, actions: Value) -> ClientResult<Value> {
        debug!(path, version, "POST update");
        let body = json!({ "version": version, "actions": actions });
        self.send(path, self.http.post(self.url(path)).json(&body)).await
    }

    async fn delete(&self, path: &str, version: i64) -> ClientResult<Value> {
        debug!(path, version, "DELETE");
        let request = self
            .http
            .delete(self.url(path))
            .query(&[("version", version)]);
        self.send(path, request).await
    }
}
