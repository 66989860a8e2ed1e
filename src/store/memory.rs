//! In-memory stores
//!
//! Same contract as `PgStore`, held in process memory behind a single
//! `RwLock`. Nothing survives a restart.

use axum::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use super::{AlertStore, BaselineStore, PredictionStore, StoreResult};
use crate::logic::monitoring::{AlertDetail, AlertFamily, AlertFilter, AlertRecord, AlertType, BehaviorStats};
use crate::models::{BehaviorSnapshot, PredictionRecord, ProbabilityPoint, WindowType};

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    predictions: Vec<PredictionRecord>,
    snapshots: Vec<BehaviorSnapshot>,
    alerts: Vec<AlertRecord>,
    next_alert_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a known-healthy baseline for a model
    pub fn set_baseline(&self, model_name: &str, stats: BehaviorStats) {
        self.inner
            .write()
            .snapshots
            .push(BehaviorSnapshot::new(model_name, WindowType::Baseline, stats));
    }

    pub fn alert_count(&self) -> usize {
        self.inner.read().alerts.len()
    }

    fn push_alert(&self, model_name: &str, alert_type: AlertType, detail: AlertDetail) {
        let mut inner = self.inner.write();
        inner.next_alert_id += 1;
        let id = inner.next_alert_id;
        inner.alerts.push(AlertRecord {
            id,
            model_name: model_name.to_string(),
            alert_type,
            detail,
            created_at: Utc::now(),
        });
    }

    /// Records for one model, newest first
    fn newest_first(&self, model_name: &str) -> Vec<PredictionRecord> {
        let mut records: Vec<PredictionRecord> = self
            .inner
            .read()
            .predictions
            .iter()
            .filter(|r| r.model_name == model_name)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        records.sort_by_key(|r| r.created_at);
        records.reverse();
        records
    }
}

#[async_trait]
impl PredictionStore for InMemoryStore {
    async fn append(&self, record: &PredictionRecord) -> StoreResult<()> {
        self.inner.write().predictions.push(record.clone());
        Ok(())
    }

    async fn latest_probabilities(&self, model_name: &str, limit: usize) -> StoreResult<Vec<f64>> {
        Ok(self
            .newest_first(model_name)
            .into_iter()
            .take(limit)
            .map(|r| r.probability)
            .collect())
    }

    async fn latest_record(&self, model_name: &str) -> StoreResult<Option<PredictionRecord>> {
        Ok(self.newest_first(model_name).into_iter().next())
    }

    async fn count(&self, model_name: &str) -> StoreResult<i64> {
        let inner = self.inner.read();
        Ok(inner.predictions.iter().filter(|r| r.model_name == model_name).count() as i64)
    }

    async fn probabilities_in_window(
        &self,
        model_name: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ProbabilityPoint>> {
        let mut points: Vec<ProbabilityPoint> = self
            .newest_first(model_name)
            .into_iter()
            .filter(|r| r.created_at > since)
            .map(|r| ProbabilityPoint {
                created_at: r.created_at,
                probability: r.probability,
            })
            .collect();
        points.reverse();
        Ok(points)
    }

    async fn recent_payloads(&self, model_name: &str, limit: usize) -> StoreResult<Vec<serde_json::Value>> {
        Ok(self
            .newest_first(model_name)
            .into_iter()
            .take(limit)
            .map(|r| r.input_payload)
            .collect())
    }
}

#[async_trait]
impl BaselineStore for InMemoryStore {
    async fn latest_baseline(&self, model_name: &str) -> StoreResult<Option<BehaviorStats>> {
        let inner = self.inner.read();
        let baseline_tag = WindowType::Baseline.as_str();
        Ok(inner
            .snapshots
            .iter()
            .filter(|s| s.model_name == model_name && s.window_type == baseline_tag)
            .max_by_key(|s| s.created_at)
            .map(|s| s.stats()))
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn append_confidence_alert(
        &self,
        model_name: &str,
        alert_type: AlertType,
        probability: f64,
        entropy: f64,
    ) -> StoreResult<()> {
        self.push_alert(model_name, alert_type, AlertDetail::Confidence { probability, entropy });
        Ok(())
    }

    async fn append_behavior_alert(
        &self,
        model_name: &str,
        alert_type: AlertType,
        baseline: &BehaviorStats,
        recent: &BehaviorStats,
    ) -> StoreResult<()> {
        self.push_alert(
            model_name,
            alert_type,
            AlertDetail::ModelBehavior {
                baseline: *baseline,
                recent: *recent,
            },
        );
        Ok(())
    }

    async fn count_since(&self, model_name: &str, filter: &AlertFilter, window: Duration) -> StoreResult<i64> {
        let since = Utc::now() - window;
        let inner = self.inner.read();
        Ok(inner
            .alerts
            .iter()
            .filter(|a| a.model_name == model_name && a.created_at > since && filter.matches(a.alert_type))
            .count() as i64)
    }

    async fn recent_alerts(&self, model_name: &str, limit: usize) -> StoreResult<Vec<AlertRecord>> {
        let inner = self.inner.read();
        let mut alerts = Vec::new();

        for family in [AlertFamily::Confidence, AlertFamily::ModelBehavior] {
            alerts.extend(
                inner
                    .alerts
                    .iter()
                    .rev()
                    .filter(|a| a.model_name == model_name && a.alert_type.family() == family)
                    .take(limit)
                    .cloned(),
            );
        }

        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(alerts)
    }
}
