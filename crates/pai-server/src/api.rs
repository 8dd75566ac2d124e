//! HTTP handlers for the Pai backend.

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pai_parts::{lookup, PartQueryResult};
use pai_render::{DiagramRenderer, RenderError, RenderRequest, RenderResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// Upper bound on identifiers in one `/api/parts` request.
pub const MAX_PARTS_PER_REQUEST: usize = 100;

const TOKEN_FAILED: &str = "Failed to generate token";
const RENDER_FAILED: &str = "Failed to generate diagram";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Health check handler.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handler for `GET /token`.
pub async fn token_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    state.realtime.mint().await.map(Json).map_err(|e| {
        tracing::error!("failed to mint realtime token: {}", e);
        ApiError::InternalServerError(TOKEN_FAILED.to_string())
    })
}

/// Handler for `POST /render`.
///
/// Answers either the rendered diagram or a 500 with a fixed message.
/// Rejection reasons and toolchain output stay in the log.
pub async fn render_handler(
    Extension(state): Extension<Arc<AppState>>,
    request: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<RenderResponse>, ApiError> {
    let Json(request) = request.map_err(|rejection| {
        tracing::warn!("malformed render request: {}", rejection.body_text());
        ApiError::InternalServerError(RENDER_FAILED.to_string())
    })?;

    match state.renderer.render(request.kind, &request.code).await {
        Ok(rendered) => Ok(Json(RenderResponse::encode(&rendered))),
        Err(RenderError::InvalidInput(reason)) => {
            tracing::warn!(kind = %request.kind, %reason, "rejected diagram input");
            Err(ApiError::InternalServerError(RENDER_FAILED.to_string()))
        }
        Err(e) => {
            tracing::error!(kind = %request.kind, "diagram render failed: {}", e);
            Err(ApiError::InternalServerError(RENDER_FAILED.to_string()))
        }
    }
}

/// Request body for `POST /api/parts`.
#[derive(Debug, Deserialize)]
pub struct PartsRequest {
    pub parts: Vec<String>,
}

/// Handler for `POST /api/parts`.
///
/// Always answers one record per requested identifier, in order; parts the
/// catalog cannot resolve come back as "Part not found" placeholders.
pub async fn parts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<PartsRequest>,
) -> Result<Json<Vec<PartQueryResult>>, ApiError> {
    if request.parts.is_empty() {
        return Err(ApiError::BadRequest("parts list is empty".to_string()));
    }
    if request.parts.len() > MAX_PARTS_PER_REQUEST {
        return Err(ApiError::BadRequest(format!(
            "at most {} parts per request",
            MAX_PARTS_PER_REQUEST
        )));
    }
    let catalog = state.catalog.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("parts catalog is not configured".to_string())
    })?;

    let results = lookup(catalog.as_ref(), &request.parts).await;
    let unresolved = results.iter().filter(|r| r.is_not_found()).count();
    tracing::info!(
        requested = request.parts.len(),
        unresolved,
        "parts lookup complete"
    );
    Ok(Json(results))
}
