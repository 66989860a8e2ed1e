//! Router and shared state

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

use crate::config::Config;
use crate::handlers;
use crate::logic::inference::PredictionService;
use crate::logic::monitoring::MonitoringOrchestrator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub predictor: Arc<PredictionService>,
    pub orchestrator: Arc<MonitoringOrchestrator>,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Inference
    let inference_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict));

    // Monitoring dashboard
    let monitoring_routes = Router::new()
        .route("/api/behavior", get(handlers::monitoring::behavior))
        .route("/api/drift", get(handlers::monitoring::drift))
        .route("/api/alerts", get(handlers::monitoring::alerts))
        .route("/api/overview", get(handlers::monitoring::overview))
        .route("/api/run", post(handlers::monitoring::run))
        .route("/api/status", get(handlers::monitoring::status))
        .route("/api/reference", get(handlers::monitoring::reference));

    // Combine all routes
    Router::new()
        .merge(inference_routes)
        .merge(monitoring_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
