#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pai_parts::CatalogClient;
use pai_render::{RenderConfig, RenderPipeline};
use pai_server::config::RealtimeConfig;
use pai_server::realtime::RealtimeTokenClient;
use pai_server::AppState;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;

pub struct StateBuilder {
    pub render: RenderConfig,
    pub realtime: RealtimeConfig,
    pub catalog: Option<CatalogClient>,
    pub client_dir: PathBuf,
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            realtime: RealtimeConfig::default(),
            catalog: None,
            client_dir: PathBuf::from("/nonexistent/pai-client"),
        }
    }
}

impl StateBuilder {
    pub fn build(self) -> AppState {
        AppState {
            renderer: Arc::new(RenderPipeline::new(self.render)),
            realtime: Arc::new(RealtimeTokenClient::new(self.realtime).unwrap()),
            catalog: self.catalog.map(Arc::new),
            client_dir: self.client_dir,
        }
    }

    pub fn app(self) -> Router {
        pai_server::app(self.build())
    }
}

/// Sends one request through the router and returns status and JSON body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        })
    };
    (status, json)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Writes an executable shell script and returns its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
