//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Multiple statements need the simple query protocol
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Prediction log (append-only)
CREATE TABLE IF NOT EXISTS model_predictions (
    id BIGSERIAL PRIMARY KEY,
    model_name VARCHAR(100) NOT NULL,
    model_version VARCHAR(50) NOT NULL,
    input_payload JSONB NOT NULL,
    prediction BOOLEAN NOT NULL,
    prediction_probability DOUBLE PRECISION NOT NULL,
    prediction_entropy DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Behavior snapshots; BASELINE rows are written out-of-band
CREATE TABLE IF NOT EXISTS model_behavior_stats (
    id BIGSERIAL PRIMARY KEY,
    model_name VARCHAR(100) NOT NULL,
    window_type VARCHAR(20) NOT NULL CHECK (window_type IN ('BASELINE', 'RECENT')),
    mean_probability DOUBLE PRECISION NOT NULL,
    std_probability DOUBLE PRECISION NOT NULL,
    high_risk_ratio DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Confidence alerts (per prediction)
CREATE TABLE IF NOT EXISTS model_alerts (
    id BIGSERIAL PRIMARY KEY,
    model_name VARCHAR(100) NOT NULL,
    alert_type VARCHAR(50) NOT NULL,
    probability DOUBLE PRECISION NOT NULL,
    entropy DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Behavior alerts (per window, both snapshots kept for audit)
CREATE TABLE IF NOT EXISTS model_behavior_alerts (
    id BIGSERIAL PRIMARY KEY,
    model_name VARCHAR(100) NOT NULL,
    alert_type VARCHAR(50) NOT NULL,
    baseline_mean DOUBLE PRECISION NOT NULL,
    baseline_std DOUBLE PRECISION NOT NULL,
    baseline_high_risk_ratio DOUBLE PRECISION NOT NULL,
    recent_mean DOUBLE PRECISION NOT NULL,
    recent_std DOUBLE PRECISION NOT NULL,
    recent_high_risk_ratio DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_predictions_model_created ON model_predictions(model_name, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_behavior_stats_lookup ON model_behavior_stats(model_name, window_type, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_alerts_model_created ON model_alerts(model_name, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_behavior_alerts_model_created ON model_behavior_alerts(model_name, created_at DESC);
"#;
