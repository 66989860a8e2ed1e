//! fraudwatch server
//!
//! Scores transactions, logs every prediction and watches the model's own
//! behavior and input distribution for silent failures.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fraudwatch::config::Config;
use fraudwatch::db;
use fraudwatch::logic::drift::{compute_reference_stats, save_reference_stats, JsonReferenceFile};
use fraudwatch::logic::features::FeatureMatrix;
use fraudwatch::logic::features::{FeatureSchema, FeatureTransformer};
use fraudwatch::logic::inference::PredictionService;
use fraudwatch::logic::model::OnnxModel;
use fraudwatch::logic::monitoring::{spawn_monitor_loop, MonitoringOrchestrator};
use fraudwatch::store::{PgStore, Stores};
use fraudwatch::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fraudwatch=debug,tower_http=debug".into());
    if config.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("fraudwatch starting ({})...", config.environment);
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    // Feature schema and model
    let schema = FeatureSchema::load(&config.feature_schema_path)
        .with_context(|| format!("Failed to load feature schema from {}", config.feature_schema_path.display()))?;
    tracing::info!(
        features = schema.feature_count(),
        fingerprint = %schema.fingerprint(),
        "Feature schema loaded"
    );
    let transformer = Arc::new(FeatureTransformer::new(Arc::new(schema)));

    let model = OnnxModel::load(&config.model_path, config.model_output.as_deref())
        .context("Failed to load model")?;

    let reference = Arc::new(JsonReferenceFile::new(&config.reference_data_path, transformer.clone()));

    // Build application state
    let stores = Stores::shared(Arc::new(PgStore::new(pool)));
    let predictor = PredictionService::new(
        config.model_name.clone(),
        config.model_version.clone(),
        transformer.clone(),
        Arc::new(model),
        stores.predictions.clone(),
        stores.alerts.clone(),
    );
    let orchestrator = Arc::new(MonitoringOrchestrator::new(
        stores,
        transformer,
        reference,
        config.monitor(),
    ));

    // Reference sample is optional at startup; drift checks retry the load
    match orchestrator.reference_matrix().await {
        Ok(matrix) => {
            if let Some(path) = &config.reference_stats_path {
                write_reference_stats(&matrix, path);
            }
        }
        Err(e) => tracing::warn!("Reference sample unavailable: {}", e),
    }

    // Background behavior monitoring
    match config.monitor_interval() {
        Some(period) => {
            spawn_monitor_loop(orchestrator.clone(), config.model_name.clone(), period);
        }
        None => tracing::info!("Background monitoring disabled"),
    }

    let state = AppState {
        config: config.clone(),
        predictor: Arc::new(predictor),
        orchestrator,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// The artifact is optional; failing to write it only warns
fn write_reference_stats(matrix: &FeatureMatrix, path: &std::path::Path) {
    match save_reference_stats(&compute_reference_stats(matrix), path) {
        Ok(()) => tracing::info!("Reference statistics written to {}", path.display()),
        Err(e) => tracing::warn!("Could not write reference statistics: {}", e),
    }
}
