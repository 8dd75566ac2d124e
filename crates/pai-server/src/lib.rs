//! Pai backend library logic.

pub mod api;
pub mod config;
pub mod realtime;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use config::Config;
use pai_parts::CatalogClient;
use pai_render::RenderPipeline;
use realtime::{RealtimeTokenClient, TokenError};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Maximum request body size (1 MiB). Diagram bodies are capped well below this.
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Local diagram toolchain.
    pub renderer: Arc<RenderPipeline>,
    /// Realtime session token minting.
    pub realtime: Arc<RealtimeTokenClient>,
    /// Parts catalog, `None` when no credentials are configured.
    pub catalog: Option<Arc<CatalogClient>>,
    /// Directory of the built client bundle.
    pub client_dir: PathBuf,
}

impl AppState {
    /// Builds the shared services from configuration.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, TokenError> {
        let catalog = match CatalogClient::new(&config.parts) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("parts lookup disabled: {}", e);
                None
            }
        };

        Ok(Self {
            renderer: Arc::new(RenderPipeline::new(config.render.clone())),
            realtime: Arc::new(RealtimeTokenClient::new(config.realtime.clone())?),
            catalog,
            client_dir: config.client.dir.clone(),
        })
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(api::health))
        .route("/token", get(api::token_handler))
        .route("/render", post(api::render_handler))
        .route("/api/parts", post(api::parts_handler));

    // Serve client static files if the directory exists.
    let client_dir = &state.client_dir;
    if !client_dir.is_absolute() {
        tracing::warn!(
            path = %client_dir.display(),
            "client directory is relative; static file serving depends on working directory"
        );
    }
    let router = if client_dir.join("index.html").exists() {
        tracing::info!(path = %client_dir.display(), "serving client static files");
        router.fallback_service(
            ServeDir::new(client_dir).fallback(ServeFile::new(client_dir.join("index.html"))),
        )
    } else {
        tracing::info!(
            path = %client_dir.display(),
            "client directory not found, skipping static file serving"
        );
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
