//! Application state and HTTP router construction.
//!
//! Used by `main` and by the integration tests to build the Axum app.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::db::Database;
use crate::services::FeedClient;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub feed: Arc<FeedClient>,
}

impl AppState {
    /// Wire the handlers' dependencies from configuration and an open database
    pub fn new(config: Arc<Config>, db: Database) -> Result<Self> {
        let feed = Arc::new(FeedClient::from_config(&config)?);
        Ok(Self { config, db, feed })
    }
}

/// Build the full Axum router: health endpoints, /api/profile, layers.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        .merge(api::health::router())
        .nest("/api/profile", api::profile::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
