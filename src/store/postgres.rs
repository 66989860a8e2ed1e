//! PostgreSQL-backed stores

use axum::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use super::{AlertStore, BaselineStore, PredictionStore, StoreError, StoreResult};
use crate::logic::monitoring::{AlertFamily, AlertFilter, AlertRecord, AlertType, BehaviorStats};
use crate::models::{
    BehaviorAlertRow, BehaviorSnapshot, ConfidenceAlertRow, PredictionRecord, ProbabilityPoint, WindowType,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PredictionStore for PgStore {
    async fn append(&self, record: &PredictionRecord) -> StoreResult<()> {
        record.insert(&self.pool).await?;
        Ok(())
    }

    async fn latest_probabilities(&self, model_name: &str, limit: usize) -> StoreResult<Vec<f64>> {
        Ok(PredictionRecord::latest_probabilities(&self.pool, model_name, limit as i64).await?)
    }

    async fn latest_record(&self, model_name: &str) -> StoreResult<Option<PredictionRecord>> {
        Ok(PredictionRecord::find_latest(&self.pool, model_name).await?)
    }

    async fn count(&self, model_name: &str) -> StoreResult<i64> {
        Ok(PredictionRecord::count(&self.pool, model_name).await?)
    }

    async fn probabilities_in_window(
        &self,
        model_name: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ProbabilityPoint>> {
        Ok(PredictionRecord::probabilities_since(&self.pool, model_name, since).await?)
    }

    async fn recent_payloads(&self, model_name: &str, limit: usize) -> StoreResult<Vec<serde_json::Value>> {
        Ok(PredictionRecord::recent_payloads(&self.pool, model_name, limit as i64).await?)
    }
}

#[async_trait]
impl BaselineStore for PgStore {
    async fn latest_baseline(&self, model_name: &str) -> StoreResult<Option<BehaviorStats>> {
        let snapshot = BehaviorSnapshot::find_latest(&self.pool, model_name, WindowType::Baseline).await?;
        Ok(snapshot.map(|s| s.stats()))
    }
}

#[async_trait]
impl AlertStore for PgStore {
    async fn append_confidence_alert(
        &self,
        model_name: &str,
        alert_type: AlertType,
        probability: f64,
        entropy: f64,
    ) -> StoreResult<()> {
        ConfidenceAlertRow::insert(&self.pool, model_name, alert_type, probability, entropy).await?;
        Ok(())
    }

    async fn append_behavior_alert(
        &self,
        model_name: &str,
        alert_type: AlertType,
        baseline: &BehaviorStats,
        recent: &BehaviorStats,
    ) -> StoreResult<()> {
        BehaviorAlertRow::insert(&self.pool, model_name, alert_type, baseline, recent).await?;
        Ok(())
    }

    async fn count_since(&self, model_name: &str, filter: &AlertFilter, window: Duration) -> StoreResult<i64> {
        let since = Utc::now() - window;
        let (confidence, behavior): (Vec<AlertType>, Vec<AlertType>) = filter
            .types()
            .into_iter()
            .partition(|t| t.family() == AlertFamily::Confidence);

        let mut total = 0;
        if !confidence.is_empty() {
            total += ConfidenceAlertRow::count_since(&self.pool, model_name, type_names(&confidence), since).await?;
        }
        if !behavior.is_empty() {
            total += BehaviorAlertRow::count_since(&self.pool, model_name, type_names(&behavior), since).await?;
        }
        Ok(total)
    }

    async fn recent_alerts(&self, model_name: &str, limit: usize) -> StoreResult<Vec<AlertRecord>> {
        let confidence = ConfidenceAlertRow::list_recent(&self.pool, model_name, limit as i64).await?;
        let behavior = BehaviorAlertRow::list_recent(&self.pool, model_name, limit as i64).await?;

        let mut alerts = Vec::with_capacity(confidence.len() + behavior.len());
        for row in confidence {
            alerts.push(AlertRecord::try_from(row).map_err(|e| StoreError::Corrupt(e.to_string()))?);
        }
        for row in behavior {
            alerts.push(AlertRecord::try_from(row).map_err(|e| StoreError::Corrupt(e.to_string()))?);
        }

        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }
}

fn type_names(types: &[AlertType]) -> Vec<String> {
    types.iter().map(|t| t.as_str().to_string()).collect()
}
