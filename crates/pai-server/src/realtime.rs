//! Ephemeral realtime session tokens.
//!
//! The browser never sees the API key: it asks `/token`, the server creates
//! a realtime session upstream and passes the session object (including the
//! short-lived client secret) straight through.

use crate::config::RealtimeConfig;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("realtime API key is not configured")]
    MissingApiKey,

    #[error("session request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("session endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    model: &'a str,
    voice: &'a str,
}

/// Creates realtime sessions with the configured model and voice.
#[derive(Debug)]
pub struct RealtimeTokenClient {
    http: reqwest::Client,
    config: RealtimeConfig,
}

impl RealtimeTokenClient {
    pub fn new(config: RealtimeConfig) -> Result<Self, TokenError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    /// Requests a new session and returns the upstream JSON unchanged.
    pub async fn mint(&self) -> Result<Value, TokenError> {
        if self.config.api_key.is_empty() {
            return Err(TokenError::MissingApiKey);
        }

        let response = self
            .http
            .post(&self.config.sessions_url)
            .bearer_auth(&self.config.api_key)
            .json(&SessionRequest {
                model: &self.config.model,
                voice: &self.config.voice,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let session = response.json::<Value>().await?;
        tracing::info!(model = %self.config.model, "minted realtime session token");
        Ok(session)
    }
}
