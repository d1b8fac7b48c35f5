use crate::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};

/// Connection settings of the commerce API.
///
/// The [`Debug`] impl redacts the client secret.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API, without the project key.
    pub api_url: String,
    /// Base URL of the authorization server.
    pub auth_url: String,
    pub project_key: String,
    pub client_id: String,
    pub client_secret: String,
    /// Requested scopes. Empty requests `manage_project:{project_key}`.
    pub scopes: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.europe-west1.gcp.commercetools.com".to_string(),
            auth_url: "https://auth.europe-west1.gcp.commercetools.com".to_string(),
            project_key: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            scopes: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .field("project_key", &self.project_key)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Defaults overridden by the `CTP_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies `CTP_API_URL`, `CTP_AUTH_URL`, `CTP_PROJECT_KEY`,
    /// `CTP_CLIENT_ID`, `CTP_CLIENT_SECRET` and `CTP_SCOPES` as found by
    /// `lookup`. Scopes are separated by whitespace.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |slot: &mut String, name: &str| {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        };
        set(&mut self.api_url, "CTP_API_URL");
        set(&mut self.auth_url, "CTP_AUTH_URL");
        set(&mut self.project_key, "CTP_PROJECT_KEY");
        set(&mut self.client_id, "CTP_CLIENT_ID");
        set(&mut self.client_secret, "CTP_CLIENT_SECRET");
        if let Some(scopes) = lookup("CTP_SCOPES") {
            self.scopes = scopes.split_whitespace().map(str::to_string).collect();
        }
        self
    }

    /// Scopes sent with the token request.
    #[must_use]
    pub fn effective_scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            vec![format!("manage_project:{}", self.project_key)]
        } else {
            self.scopes.clone()
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        for (name, value) in [
            ("api_url", &self.api_url),
            ("auth_url", &self.auth_url),
            ("project_key", &self.project_key),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(ClientError::Config(format!("{name} is not set")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn overrides_replace_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CTP_PROJECT_KEY", "acme"),
            ("CTP_CLIENT_ID", "id"),
            ("CTP_CLIENT_SECRET", "secret"),
            ("CTP_SCOPES", "manage_products:acme  view_orders:acme"),
        ]);
        let config = ClientConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.project_key, "acme");
        assert_eq!(config.scopes, vec!["manage_products:acme", "view_orders:acme"]);
        assert!(config.api_url.starts_with("https://api."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let err = ClientConfig::default().validate().unwrap_err();
        assert!(matches!(err, ClientError::Config(ref m) if m.contains("project_key")));
    }

    #[test]
    fn debug_hides_secret() {
        let config = ClientConfig {
            client_secret: "hunter2".into(),
            ..ClientConfig::default()
        };
        assert!(!format!("{config:?}").contains("hunter2"));
        assert_eq!(config.effective_scopes(), vec!["manage_project:".to_string()]);
    }
}
