//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
    storage: &'static str,
    timestamp: i64,
}

/// Liveness plus a cheap storage probe
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = match state
        .orchestrator
        .stores()
        .predictions
        .count(&state.config.model_name)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!("Health check storage probe failed: {}", e);
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: if storage == "ok" { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        model: state.config.model_name.clone(),
        storage,
        timestamp: chrono::Utc::now().timestamp(),
    })
}
