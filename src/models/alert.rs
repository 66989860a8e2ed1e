//! Alert models
//!
//! Confidence alerts (`model_alerts`) and behavior alerts
//! (`model_behavior_alerts`) live in separate tables; both are append-only.

use sqlx::{FromRow, PgPool};
use chrono::{DateTime, Utc};

use crate::logic::monitoring::{AlertDetail, AlertRecord, AlertType, BehaviorStats, UnknownAlertType};

#[derive(Debug, Clone, FromRow)]
pub struct ConfidenceAlertRow {
    pub id: i64,
    pub model_name: String,
    pub alert_type: String,
    pub probability: f64,
    pub entropy: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BehaviorAlertRow {
    pub id: i64,
    pub model_name: String,
    pub alert_type: String,
    pub baseline_mean: f64,
    pub baseline_std: f64,
    pub baseline_high_risk_ratio: f64,
    pub recent_mean: f64,
    pub recent_std: f64,
    pub recent_high_risk_ratio: f64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ConfidenceAlertRow> for AlertRecord {
    type Error = UnknownAlertType;

    fn try_from(row: ConfidenceAlertRow) -> Result<Self, Self::Error> {
        Ok(AlertRecord {
            id: row.id,
            alert_type: row.alert_type.parse::<AlertType>()?,
            model_name: row.model_name,
            detail: AlertDetail::Confidence {
                probability: row.probability,
                entropy: row.entropy,
            },
            created_at: row.created_at,
        })
    }
}

impl TryFrom<BehaviorAlertRow> for AlertRecord {
    type Error = UnknownAlertType;

    fn try_from(row: BehaviorAlertRow) -> Result<Self, Self::Error> {
        Ok(AlertRecord {
            id: row.id,
            alert_type: row.alert_type.parse::<AlertType>()?,
            model_name: row.model_name,
            detail: AlertDetail::ModelBehavior {
                baseline: BehaviorStats {
                    mean: row.baseline_mean,
                    std: row.baseline_std,
                    high_risk_ratio: row.baseline_high_risk_ratio,
                },
                recent: BehaviorStats {
                    mean: row.recent_mean,
                    std: row.recent_std,
                    high_risk_ratio: row.recent_high_risk_ratio,
                },
            },
            created_at: row.created_at,
        })
    }
}

impl ConfidenceAlertRow {
    pub async fn insert(
        pool: &PgPool,
        model_name: &str,
        alert_type: AlertType,
        probability: f64,
        entropy: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO model_alerts (model_name, alert_type, probability, entropy, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#
        )
        .bind(model_name)
        .bind(alert_type.as_str())
        .bind(probability)
        .bind(entropy)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_recent(pool: &PgPool, model_name: &str, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ConfidenceAlertRow>(
            r#"
            SELECT id, model_name, alert_type, probability, entropy, created_at
            FROM model_alerts
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

    pub async fn count_since(
        pool: &PgPool,
        model_name: &str,
        types: Vec<String>,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM model_alerts
            WHERE model_name = $1 AND alert_type = ANY($2) AND created_at > $3
            "#
        )
        .bind(model_name)
        .bind(types)
        .bind(since)
        .fetch_one(pool)
        .await
    }
}

impl BehaviorAlertRow {
    pub async fn insert(
        pool: &PgPool,
        model_name: &str,
        alert_type: AlertType,
        baseline: &BehaviorStats,
        recent: &BehaviorStats,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO model_behavior_alerts (
                model_name, alert_type,
                baseline_mean, baseline_std, baseline_high_risk_ratio,
                recent_mean, recent_std, recent_high_risk_ratio,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            "#
        )
        .bind(model_name)
        .bind(alert_type.as_str())
        .bind(baseline.mean)
        .bind(baseline.std)
        .bind(baseline.high_risk_ratio)
        .bind(recent.mean)
        .bind(recent.std)
        .bind(recent.high_risk_ratio)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_recent(pool: &PgPool, model_name: &str, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BehaviorAlertRow>(
            r#"
            SELECT id, model_name, alert_type,
                   baseline_mean, baseline_std, baseline_high_risk_ratio,
                   recent_mean, recent_std, recent_high_risk_ratio,
                   created_at
            FROM model_behavior_alerts
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

    pub async fn count_since(
        pool: &PgPool,
        model_name: &str,
        types: Vec<String>,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM model_behavior_alerts
            WHERE model_name = $1 AND alert_type = ANY($2) AND created_at > $3
            "#
        )
        .bind(model_name)
        .bind(types)
        .bind(since)
        .fetch_one(pool)
        .await
    }
}
