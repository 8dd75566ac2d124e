use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

fn default_token_url() -> String {
    "https://identity.nexar.com/connect/token".to_string()
}

fn default_graphql_url() -> String {
    "https://api.nexar.com/graphql".to_string()
}

fn default_preferred_seller() -> Option<String> {
    Some("DigiKey".to_string())
}

fn default_refresh_margin_seconds() -> u64 {
    300
}

fn default_request_timeout_seconds() -> u64 {
    15
}

/// Catalog endpoints and client credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct PartsConfig {
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default, skip_serializing)]
    pub client_secret: String,
    /// Seller whose offer is preferred when several sell the part.
    #[serde(default = "default_preferred_seller")]
    pub preferred_seller: Option<String>,
    /// Refresh the access token this many seconds before it expires. Default: 300.
    #[serde(default = "default_refresh_margin_seconds")]
    pub refresh_margin_seconds: u64,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for PartsConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            graphql_url: default_graphql_url(),
            client_id: String::new(),
            client_secret: String::new(),
            preferred_seller: default_preferred_seller(),
            refresh_margin_seconds: default_refresh_margin_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl fmt::Debug for PartsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartsConfig")
            .field("token_url", &self.token_url)
            .field("graphql_url", &self.graphql_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("preferred_seller", &self.preferred_seller)
            .field("refresh_margin_seconds", &self.refresh_margin_seconds)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl PartsConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// Returns `true` when both client credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
