//! Client-credentials access token, cached per process.

use crate::config::PartsConfig;
use crate::error::PartsError;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Lifetime assumed when the identity server omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Longest lifetime honoured from the identity server.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Caches the catalog bearer token and refreshes it before expiry.
///
/// The lock is held across the refresh request so concurrent lookups share
/// a single token fetch.
#[derive(Debug)]
pub struct TokenCache {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_margin: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(http: reqwest::Client, config: &PartsConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_margin: config.refresh_margin(),
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid access token, fetching a new one if needed.
    pub async fn access_token(&self) -> Result<String, PartsError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            let fresh_until = Instant::now().checked_add(self.refresh_margin);
            if fresh_until.is_some_and(|deadline| token.expires_at > deadline) {
                return Ok(token.access_token.clone());
            }
            tracing::debug!("catalog token close to expiry, refreshing");
        }

        let fresh = self.fetch().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    /// Drops the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch(&self) -> Result<CachedToken, PartsError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(PartsError::MissingCredentials);
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PartsError::Token(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartsError::Token(format!(
                "identity server returned {}",
                status
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PartsError::Token(format!("invalid token response: {}", e)))?;

        let lifetime = body
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME)
            .min(MAX_TOKEN_LIFETIME);
        let expires_at = Instant::now()
            .checked_add(lifetime)
            .ok_or_else(|| PartsError::Token("token lifetime out of range".to_string()))?;

        tracing::info!(expires_in_seconds = lifetime.as_secs(), "obtained catalog token");

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at,
        })
    }
}
