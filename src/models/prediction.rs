//! Prediction log model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use chrono::{DateTime, Utc};

/// Probability at or above which a transaction is classified as fraud
pub const DECISION_THRESHOLD: f64 = 0.5;

/// One scored event. Written once per inference, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PredictionRecord {
    pub model_name: String,
    pub model_version: String,
    pub input_payload: serde_json::Value,
    #[sqlx(rename = "prediction")]
    pub decision: bool,
    #[sqlx(rename = "prediction_probability")]
    pub probability: f64,
    #[sqlx(rename = "prediction_entropy")]
    pub entropy: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProbabilityPoint {
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "prediction_probability")]
    pub probability: f64,
}

impl PredictionRecord {
    pub fn new(
        model_name: &str,
        model_version: &str,
        input_payload: serde_json::Value,
        probability: f64,
        entropy: f64,
    ) -> Self {
        Self {
            model_name: model_name.to_string(),
            model_version: model_version.to_string(),
            input_payload,
            decision: probability >= DECISION_THRESHOLD,
            probability,
            entropy,
            created_at: Utc::now(),
        }
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO model_predictions
                (model_name, model_version, input_payload, prediction, prediction_probability, prediction_entropy, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#
        )
        .bind(&self.model_name)
        .bind(&self.model_version)
        .bind(&self.input_payload)
        .bind(self.decision)
        .bind(self.probability)
        .bind(self.entropy)
        .bind(self.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn latest_probabilities(
        pool: &PgPool,
        model_name: &str,
        limit: i64,
    ) -> Result<Vec<f64>, sqlx::Error> {
        sqlx::query_scalar::<_, f64>(
            r#"
            SELECT prediction_probability
            FROM model_predictions
            WHERE model_name = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(model_name)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn find_latest(pool: &PgPool, model_name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PredictionRecord>(
            r#"
            SELECT model_name, model_version, input_payload, prediction,
                   prediction_probability, prediction_entropy, created_at
            FROM model_predictions
            WHERE model_name = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(model_name)
        .fetch_optional(pool)
        .await
    }

    pub async fn count(pool: &PgPool, model_name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM model_predictions WHERE model_name = $1")
            .bind(model_name)
            .fetch_one(pool)
            .await
    }

    pub async fn probabilities_since(
        pool: &PgPool,
        model_name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ProbabilityPoint>, sqlx::Error> {
        sqlx::query_as::<_, ProbabilityPoint>(
            r#"
            SELECT created_at, prediction_probability
            FROM model_predictions
            WHERE model_name = $1 AND created_at > $2
            ORDER BY created_at ASC
            "#
        )
        .bind(model_name)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    pub async fn recent_payloads(
        pool: &PgPool,
        model_name: &str,
        limit: i64,
    ) -> Result<Vec<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            SELECT input_payload
            FROM model_predictions
            WHERE model_name = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(model_name)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
