//! Behavior statistics snapshot model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use chrono::{DateTime, Utc};

use crate::logic::monitoring::BehaviorStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowType {
    Baseline,
    Recent,
}

impl WindowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowType::Baseline => "BASELINE",
            WindowType::Recent => "RECENT",
        }
    }
}

/// A persisted `{mean, std, high_risk_ratio}` row. Baseline rows are written
/// out-of-band; this service only reads the newest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BehaviorSnapshot {
    pub model_name: String,
    pub window_type: String,
    #[sqlx(rename = "mean_probability")]
    pub mean: f64,
    #[sqlx(rename = "std_probability")]
    pub std: f64,
    pub high_risk_ratio: f64,
    pub created_at: DateTime<Utc>,
}

impl BehaviorSnapshot {
    pub fn new(model_name: &str, window_type: WindowType, stats: BehaviorStats) -> Self {
        Self {
            model_name: model_name.to_string(),
            window_type: window_type.as_str().to_string(),
            mean: stats.mean,
            std: stats.std,
            high_risk_ratio: stats.high_risk_ratio,
            created_at: Utc::now(),
        }
    }

    pub fn stats(&self) -> BehaviorStats {
        BehaviorStats {
            mean: self.mean,
            std: self.std,
            high_risk_ratio: self.high_risk_ratio,
        }
    }

    pub async fn find_latest(
        pool: &PgPool,
        model_name: &str,
        window_type: WindowType,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BehaviorSnapshot>(
            r#"
            SELECT model_name, window_type, mean_probability, std_probability, high_risk_ratio, created_at
            FROM model_behavior_stats
            WHERE model_name = $1 AND window_type = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(model_name)
        .bind(window_type.as_str())
        .fetch_optional(pool)
        .await
    }
}
