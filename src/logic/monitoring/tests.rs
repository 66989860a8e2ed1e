use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::async_trait;
use chrono::{DateTime, Duration, Utc};
use ndarray::Array2;
use serde_json::{json, Value};

use super::*;
use crate::logic::drift::{DriftError, DriftStatus, ReferenceDataSource, ReferenceError, StaticReference};
use crate::logic::features::{FeatureMatrix, FeatureSchema, FeatureTransformer};
use crate::models::{PredictionRecord, ProbabilityPoint};
use crate::store::{
    AlertStore, BaselineStore, InMemoryStore, PredictionStore, StoreError, StoreResult, Stores,
};

const MODEL: &str = "fraud_xgb";

// ============================================================================
// FIXTURES
// ============================================================================

fn transformer() -> Arc<FeatureTransformer> {
    let schema = FeatureSchema::new(
        vec!["nameOrig".to_string()],
        vec!["type".to_string()],
        vec!["type_CASH_OUT".to_string(), "type_PAYMENT".to_string()],
        vec!["amount".to_string(), "type_CASH_OUT".to_string(), "type_PAYMENT".to_string()],
        None,
    )
    .unwrap();
    Arc::new(FeatureTransformer::new(Arc::new(schema)))
}

fn payload(i: usize) -> Value {
    let kind = if i % 2 == 0 { "PAYMENT" } else { "CASH_OUT" };
    json!({ "nameOrig": format!("C{}", i), "type": kind, "amount": (i % 20) as f64 * 10.0 })
}

fn reference_matrix(rows: usize) -> FeatureMatrix {
    let transformer = transformer();
    let payloads: Vec<Value> = (0..rows).map(payload).collect();
    transformer.transform_values(&payloads).unwrap()
}

fn orchestrator(store: Arc<InMemoryStore>) -> MonitoringOrchestrator {
    MonitoringOrchestrator::new(
        Stores::shared(store),
        transformer(),
        Arc::new(StaticReference::new(reference_matrix(40))),
        MonitorConfig::default(),
    )
}

async fn log_probabilities(store: &InMemoryStore, probabilities: &[f64]) {
    for (i, p) in probabilities.iter().enumerate() {
        let record = PredictionRecord::new(MODEL, "v1.0", payload(i), *p, prediction_entropy(*p));
        store.append(&record).await.unwrap();
    }
}

fn baseline() -> BehaviorStats {
    BehaviorStats { mean: 0.3, std: 0.2, high_risk_ratio: 0.35 }
}

/// Every call fails as if the database were down
struct DownStore;

#[async_trait]
impl PredictionStore for DownStore {
    async fn append(&self, _: &PredictionRecord) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn latest_probabilities(&self, _: &str, _: usize) -> StoreResult<Vec<f64>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn latest_record(&self, _: &str) -> StoreResult<Option<PredictionRecord>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn count(&self, _: &str) -> StoreResult<i64> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn probabilities_in_window(&self, _: &str, _: DateTime<Utc>) -> StoreResult<Vec<ProbabilityPoint>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn recent_payloads(&self, _: &str, _: usize) -> StoreResult<Vec<Value>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[async_trait]
impl BaselineStore for DownStore {
    async fn latest_baseline(&self, _: &str) -> StoreResult<Option<BehaviorStats>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[async_trait]
impl AlertStore for DownStore {
    async fn append_confidence_alert(&self, _: &str, _: AlertType, _: f64, _: f64) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn append_behavior_alert(
        &self,
        _: &str,
        _: AlertType,
        _: &BehaviorStats,
        _: &BehaviorStats,
    ) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn count_since(&self, _: &str, _: &AlertFilter, _: Duration) -> StoreResult<i64> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn recent_alerts(&self, _: &str, _: usize) -> StoreResult<Vec<AlertRecord>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

// ============================================================================
// BEHAVIOR RUNS
// ============================================================================

#[tokio::test]
async fn test_skipped_without_baseline() {
    let store = Arc::new(InMemoryStore::new());
    log_probabilities(&store, &[0.5; 20]).await;

    let outcome = orchestrator(store.clone()).run(MODEL).await;
    assert_eq!(
        outcome,
        MonitorOutcome::Skipped {
            model_name: MODEL.to_string(),
            reason: SkipReason::BaselineNotFound,
            data_count: None,
            required: None,
        }
    );
    assert_eq!(store.alert_count(), 0);
}

#[tokio::test]
async fn test_skipped_below_min_samples() {
    let store = Arc::new(InMemoryStore::new());
    store.set_baseline(MODEL, baseline());
    log_probabilities(&store, &[0.9; 9]).await;

    let outcome = orchestrator(store.clone()).run(MODEL).await;
    assert_eq!(
        outcome,
        MonitorOutcome::Skipped {
            model_name: MODEL.to_string(),
            reason: SkipReason::NotEnoughData,
            data_count: Some(9),
            required: Some(10),
        }
    );
    assert_eq!(store.alert_count(), 0);
}

#[tokio::test]
async fn test_mean_shift_alert_is_persisted() {
    let store = Arc::new(InMemoryStore::new());
    store.set_baseline(MODEL, baseline());
    log_probabilities(&store, &[0.95; 12]).await;

    let outcome = orchestrator(store.clone()).run(MODEL).await;
    let MonitorOutcome::AlertTriggered { reason, baseline: b, recent, .. } = outcome else {
        panic!("expected alert, got {:?}", outcome);
    };
    assert_eq!(reason, ShiftType::MeanShift);
    assert_eq!(b, baseline());
    assert!((recent.mean - 0.95).abs() < 1e-12);

    let alerts = store.recent_alerts(MODEL, 10).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::MeanShift);
    assert_eq!(alerts[0].detail, AlertDetail::ModelBehavior { baseline: baseline(), recent });
}

#[tokio::test]
async fn test_risk_ratio_floor_alert() {
    let store = Arc::new(InMemoryStore::new());
    store.set_baseline(MODEL, baseline());
    // Mean stays in band but nothing is flagged as high risk
    log_probabilities(&store, &[0.3; 15]).await;

    let outcome = orchestrator(store.clone()).run(MODEL).await;
    assert!(matches!(
        outcome,
        MonitorOutcome::AlertTriggered { reason: ShiftType::RiskRatioShift, .. }
    ));
    assert_eq!(store.alert_count(), 1);
}

#[tokio::test]
async fn test_healthy_run() {
    let store = Arc::new(InMemoryStore::new());
    store.set_baseline(MODEL, baseline());
    // 4 of 10 above 0.8: ratio 0.4 sits between the floor and 1.5x baseline
    let window = [0.05, 0.05, 0.05, 0.05, 0.05, 0.05, 0.85, 0.85, 0.85, 0.85];
    log_probabilities(&store, &window).await;

    let outcome = orchestrator(store.clone()).run(MODEL).await;
    assert_eq!(outcome.status(), "healthy");
    assert_eq!(store.alert_count(), 0);
}

#[tokio::test]
async fn test_recent_window_is_capped() {
    let store = Arc::new(InMemoryStore::new());
    store.set_baseline(MODEL, baseline());
    // Old shifted history followed by a healthy recent window of 10
    log_probabilities(&store, &[0.99; 60]).await;
    let healthy = [0.05, 0.05, 0.05, 0.05, 0.05, 0.05, 0.85, 0.85, 0.85, 0.85];
    log_probabilities(&store, &healthy).await;

    let config = MonitorConfig { recent_window: 10, ..MonitorConfig::default() };
    let orchestrator = MonitoringOrchestrator::new(
        Stores::shared(store.clone()),
        transformer(),
        Arc::new(StaticReference::new(reference_matrix(10))),
        config,
    );

    let stats = orchestrator.recent_stats(MODEL).await.unwrap().unwrap();
    assert!((stats.high_risk_ratio - 0.4).abs() < 1e-12);
    assert_eq!(orchestrator.run(MODEL).await.status(), "healthy");
}

#[tokio::test]
async fn test_store_failure_becomes_error_outcome() {
    let orchestrator = MonitoringOrchestrator::new(
        Stores::shared(Arc::new(DownStore)),
        transformer(),
        Arc::new(StaticReference::new(reference_matrix(10))),
        MonitorConfig::default(),
    );

    let outcome = orchestrator.run(MODEL).await;
    match outcome {
        MonitorOutcome::Error { model_name, error } => {
            assert_eq!(model_name, MODEL);
            assert!(error.contains("connection refused"));
        }
        other => panic!("expected error outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_alert_write_failure_becomes_error_outcome() {
    let store = Arc::new(InMemoryStore::new());
    store.set_baseline(MODEL, baseline());
    log_probabilities(&store, &[0.95; 12]).await;

    let stores = Stores {
        predictions: store.clone(),
        baselines: store.clone(),
        alerts: Arc::new(DownStore),
    };
    let orchestrator = MonitoringOrchestrator::new(
        stores,
        transformer(),
        Arc::new(StaticReference::new(reference_matrix(10))),
        MonitorConfig::default(),
    );

    assert_eq!(orchestrator.run(MODEL).await.status(), "error");
}

#[test]
fn test_outcome_serialization() {
    let skipped = MonitorOutcome::Skipped {
        model_name: MODEL.to_string(),
        reason: SkipReason::NotEnoughData,
        data_count: Some(3),
        required: Some(10),
    };
    let json = serde_json::to_value(&skipped).unwrap();
    assert_eq!(json["status"], "skipped");
    assert_eq!(json["reason"], "not_enough_data");
    assert_eq!(json["data_count"], 3);

    let alert = MonitorOutcome::AlertTriggered {
        model_name: MODEL.to_string(),
        reason: ShiftType::RiskRatioShift,
        baseline: baseline(),
        recent: baseline(),
    };
    let json = serde_json::to_value(&alert).unwrap();
    assert_eq!(json["status"], "alert_triggered");
    assert_eq!(json["reason"], "RISK_RATIO_SHIFT");
    assert_eq!(json["baseline"]["high_risk_ratio"], 0.35);

    let no_baseline = MonitorOutcome::Skipped {
        model_name: MODEL.to_string(),
        reason: SkipReason::BaselineNotFound,
        data_count: None,
        required: None,
    };
    let json = serde_json::to_value(&no_baseline).unwrap();
    assert!(json.get("data_count").is_none());
}

// ============================================================================
// DRIFT CHECKS
// ============================================================================

#[tokio::test]
async fn test_drift_check_without_recent_data() {
    let store = Arc::new(InMemoryStore::new());
    let err = orchestrator(store).check_drift(MODEL).await.unwrap_err();
    assert!(matches!(err, DriftCheckError::NoRecentData(ref m) if m == MODEL));
}

#[tokio::test]
async fn test_drift_check_same_distribution() {
    let store = Arc::new(InMemoryStore::new());
    log_probabilities(&store, &[0.2; 40]).await;

    let check = orchestrator(store).check_drift(MODEL).await.unwrap();
    assert_eq!(check.reference_size, 40);
    assert_eq!(check.recent_size, 40);
    assert_eq!(check.report.summary.total_features, 3);
    assert_eq!(check.report.summary.drifted_features, 0);
    assert_eq!(check.report.summary.status, DriftStatus::LowDrift);
}

#[tokio::test]
async fn test_drift_check_shifted_amounts() {
    let store = Arc::new(InMemoryStore::new());
    for i in 0..40 {
        let mut raw = payload(i);
        raw["amount"] = json!(50_000.0 + i as f64);
        let record = PredictionRecord::new(MODEL, "v1.0", raw, 0.2, 0.5);
        store.append(&record).await.unwrap();
    }

    let check = orchestrator(store).check_drift(MODEL).await.unwrap();
    assert!(check.report.feature("amount").unwrap().drift_detected());
    assert!(!check.report.feature("type_PAYMENT").unwrap().drift_detected());
    assert_eq!(check.report.summary.drifted_features, 1);
}

#[tokio::test]
async fn test_drift_check_schema_mismatch() {
    let store = Arc::new(InMemoryStore::new());
    log_probabilities(&store, &[0.2; 5]).await;

    let stale = FeatureMatrix::new(vec!["amount".to_string()], Array2::zeros((5, 1))).unwrap();
    let orchestrator = MonitoringOrchestrator::new(
        Stores::shared(store),
        transformer(),
        Arc::new(StaticReference::new(stale)),
        MonitorConfig::default(),
    );

    let err = orchestrator.check_drift(MODEL).await.unwrap_err();
    assert!(matches!(err, DriftCheckError::Drift(DriftError::SchemaMismatch { .. })));
}

#[tokio::test]
async fn test_drift_check_store_failure() {
    let orchestrator = MonitoringOrchestrator::new(
        Stores::shared(Arc::new(DownStore)),
        transformer(),
        Arc::new(StaticReference::new(reference_matrix(10))),
        MonitorConfig::default(),
    );

    let err = orchestrator.check_drift(MODEL).await.unwrap_err();
    assert!(matches!(err, DriftCheckError::Store(StoreError::Unavailable(_))));
}

/// Reference file that is missing on the first read, then present
struct LateReference {
    loads: AtomicUsize,
}

impl ReferenceDataSource for LateReference {
    fn load(&self) -> Result<FeatureMatrix, ReferenceError> {
        if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(ReferenceError::Empty);
        }
        Ok(reference_matrix(40))
    }
}

#[tokio::test]
async fn test_reference_is_loaded_once_and_failures_retry() {
    let store = Arc::new(InMemoryStore::new());
    log_probabilities(&store, &[0.2; 40]).await;

    let reference = Arc::new(LateReference { loads: AtomicUsize::new(0) });
    let orchestrator = MonitoringOrchestrator::new(
        Stores::shared(store),
        transformer(),
        reference.clone(),
        MonitorConfig::default(),
    );

    let err = orchestrator.check_drift(MODEL).await.unwrap_err();
    assert!(matches!(err, DriftCheckError::Reference(ReferenceError::Empty)));

    for _ in 0..3 {
        let check = orchestrator.check_drift(MODEL).await.unwrap();
        assert_eq!(check.reference_size, 40);
    }
    assert_eq!(orchestrator.reference_matrix().await.unwrap().nrows(), 40);
    assert_eq!(reference.loads.load(Ordering::SeqCst), 2);
}
