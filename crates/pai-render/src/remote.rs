//! Client for a backend's `POST /render` endpoint and its wire types.

use crate::error::RenderError;
use crate::{DiagramRenderer, RenderedDiagram};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pai_types::DiagramKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout for remote renders. Covers both toolchain stages.
const REMOTE_RENDER_TIMEOUT: Duration = Duration::from_secs(150);

/// Request body of `POST /render`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// The diagram body, without a document preamble.
    pub code: String,
    /// Markup kind; CircuiTikZ when omitted.
    #[serde(default)]
    pub kind: DiagramKind,
}

/// Successful response body of `POST /render`: base64-encoded artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub image: String,
    pub pdf: String,
}

impl RenderResponse {
    pub fn encode(rendered: &RenderedDiagram) -> Self {
        Self {
            image: STANDARD.encode(&rendered.image),
            pdf: rendered
                .pdf
                .as_deref()
                .map(|pdf| STANDARD.encode(pdf))
                .unwrap_or_default(),
        }
    }

    pub fn decode(&self) -> Result<RenderedDiagram, RenderError> {
        let image = STANDARD
            .decode(&self.image)
            .map_err(|e| RenderError::Remote(format!("invalid image encoding: {}", e)))?;
        let pdf = if self.pdf.is_empty() {
            None
        } else {
            Some(
                STANDARD
                    .decode(&self.pdf)
                    .map_err(|e| RenderError::Remote(format!("invalid pdf encoding: {}", e)))?,
            )
        };
        Ok(RenderedDiagram { image, pdf })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Renders diagrams through a remote backend.
#[derive(Debug, Clone)]
pub struct RemoteRenderer {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteRenderer {
    /// Creates a renderer posting to `endpoint` (the full `/render` URL).
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(REMOTE_RENDER_TIMEOUT)
            .build()
            .map_err(|e| RenderError::Remote(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl DiagramRenderer for RemoteRenderer {
    async fn render(
        &self,
        kind: DiagramKind,
        description: &str,
    ) -> Result<RenderedDiagram, RenderError> {
        let request = RenderRequest {
            code: description.to_string(),
            kind,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RenderError::Remote(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => format!("render endpoint returned {}", status),
            };
            return Err(RenderError::Remote(message));
        }

        response
            .json::<RenderResponse>()
            .await
            .map_err(|e| RenderError::Remote(format!("invalid response body: {}", e)))?
            .decode()
    }
}
