//! HTTP API Module
//!
//! This module exposes the registry over HTTP. Each request runs in its own
//! Tokio task; all of them share one [`Registry`] through [`AppState`].
//!
//! ## Routes
//!
//! ```text
//! POST <prefix>/upload     multipart: key, expiryTimeMinutes, file
//! GET  <prefix>/download   ?key=<key>&delete=<true|other>
//! ```
//!
//! Any other method on these paths, `HEAD` included, yields `405`, any other path `404`, both
//! with a `{"message": ...}` body.
//!
//! ## Example
//!
//! ```ignore
//! use temp_file_registry::config::RegistryConfig;
//! use temp_file_registry::http::{router, AppState};
//! use temp_file_registry::storage::Registry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::new());
//! let app = router(AppState::new(registry, RegistryConfig::default()));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8888").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod handlers;

use crate::config::RegistryConfig;
use crate::storage::Registry;
use crate::URL_PATH_PREFIX;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Re-export commonly used types
pub use error::{ApiError, MessageBody};
pub use handlers::{handle_download, handle_upload, DownloadParams, UploadResponse};

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The registry (shared with the expiry sweeper)
    pub registry: Arc<Registry>,
    /// Immutable settings fixed at startup
    pub config: RegistryConfig,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, config: RegistryConfig) -> Self {
        Self { registry, config }
    }
}

/// Builds the application router.
///
/// The upload body limit applies to the whole multipart request.
pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    let api = Router::new()
        .route(
            "/upload",
            post(handle_upload)
                .fallback(|| async { ApiError::MethodNotAllowed(Method::POST) })
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/download",
            // HEAD would otherwise be served by the GET handler
            get(handle_download)
                .head(|| async { ApiError::MethodNotAllowed(Method::GET) })
                .fallback(|| async { ApiError::MethodNotAllowed(Method::GET) }),
        );

    Router::new()
        .nest(URL_PATH_PREFIX, api)
        .fallback(|| async { ApiError::RouteNotFound })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
