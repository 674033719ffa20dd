use std::sync::Arc;

use axum::{
    http::header::CONTENT_DISPOSITION,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::resolver::MediaResolver;

// --- Modules ---
pub mod config;
pub mod curation;
pub mod error;
pub mod handlers;
pub mod models;
pub mod resolver;
pub mod util;

/// Shared handles passed to every request. Holds no request-scoped mutable
/// state; each request builds its own data and owns its own temp file.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<dyn MediaResolver>,
}

/// Builds the application router. Browsers must be able to read the
/// `Content-Disposition` of a finished download from another origin, so that
/// header is exposed explicitly.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/contact", get(handlers::contact))
        .route("/api/get-formats", post(handlers::get_formats))
        .route(
            "/api/download-selected-format",
            post(handlers::download_selected_format),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any)
                .expose_headers([CONTENT_DISPOSITION]),
        )
        .with_state(state)
}
