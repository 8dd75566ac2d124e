use crate::config::PartsConfig;
use crate::error::PartsError;
use crate::query::{normalize, GraphQlResponse, SearchData, SEARCH_MPN};
use crate::token::TokenCache;
use pai_types::PartQueryResult;
use reqwest::StatusCode;
use serde_json::json;
use std::future::Future;

/// A searchable parts catalog.
pub trait PartCatalog: Send + Sync + 'static {
    /// Looks up the best match for a single part identifier.
    fn search(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<PartQueryResult, PartsError>> + Send;
}

/// GraphQL supply-chain catalog client.
#[derive(Debug)]
pub struct CatalogClient {
    http: reqwest::Client,
    graphql_url: String,
    preferred_seller: Option<String>,
    tokens: TokenCache,
}

impl CatalogClient {
    /// Builds a client. Fails when credentials are missing so callers can
    /// decide at startup whether lookups are available at all.
    pub fn new(config: &PartsConfig) -> Result<Self, PartsError> {
        if !config.has_credentials() {
            return Err(PartsError::MissingCredentials);
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            tokens: TokenCache::new(http.clone(), config),
            http,
            graphql_url: config.graphql_url.clone(),
            preferred_seller: config.preferred_seller.clone(),
        })
    }

    async fn query(&self, identifier: &str) -> Result<SearchData, PartsError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(&self.graphql_url)
            .header("token", token)
            .json(&json!({
                "query": SEARCH_MPN,
                "variables": { "que": identifier },
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
            return Err(PartsError::Token("catalog rejected access token".to_string()));
        }
        if !status.is_success() {
            return Err(PartsError::GraphQl(format!("catalog returned {}", status)));
        }

        let body: GraphQlResponse<SearchData> = response
            .json()
            .await
            .map_err(|e| PartsError::Malformed(e.to_string()))?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PartsError::GraphQl(joined));
        }

        body.data
            .ok_or_else(|| PartsError::Malformed("response has no data".to_string()))
    }
}

impl PartCatalog for CatalogClient {
    async fn search(&self, identifier: &str) -> Result<PartQueryResult, PartsError> {
        let data = self.query(identifier).await?;
        normalize(identifier, data, self.preferred_seller.as_deref())
    }
}
