//! Liveness and readiness probes for the newsletter service

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct LivenessReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessReport {
    pub ready: bool,
    pub database: bool,
}

async fn healthz() -> Json<LivenessReport> {
    Json(LivenessReport {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 200 when the profile store answers, 503 otherwise
async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let database = match sqlx::query("SELECT 1").fetch_one(state.db.pool()).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Profile store is not answering");
            false
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessReport { ready: database, database }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
