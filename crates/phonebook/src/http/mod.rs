//! HTTP surface: routes, middleware and shared state.

pub mod access_log;
pub mod error;
pub mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::config::ServerConfig;
use crate::store::ContactStore;

pub use access_log::AccessLog;
pub use error::{ApiError, ErrorBody};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The injected record store.
    pub store: Arc<dyn ContactStore>,
}

impl AppState {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }
}

/// Build the application router around a store.
#[must_use]
pub fn router(store: Arc<dyn ContactStore>, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/info", get(handlers::info))
        .route(
            "/api/persons",
            get(handlers::list).post(handlers::create),
        )
        .route(
            "/api/persons/",
            get(handlers::list).post(handlers::create),
        )
        .route(
            "/api/persons/:id",
            get(handlers::get)
                .put(handlers::update)
                .delete(handlers::remove),
        )
        .with_state(AppState::new(store));

    let mut router = match config.static_dir.as_deref().filter(|dir| dir.is_dir()) {
        Some(dir) => with_static_files(api, dir),
        None => api,
    };

    let log_state = AccessLog {
        body_limit: config.body_limit_bytes,
    };
    router = router
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(middleware::from_fn_with_state(
            log_state,
            access_log::log_access,
        ));

    if config.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

fn with_static_files(api: Router, dir: &Path) -> Router {
    debug!("Serving static files from {}", dir.display());
    api.fallback_service(ServeDir::new(dir))
}
