//! Monitoring dashboard handlers
//!
//! Every route takes `?model_name=`, defaulting to the configured model.

use std::collections::BTreeMap;

use axum::{extract::{Query, State}, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::logic::drift::{compute_reference_stats, load_reference_stats, ReferenceError, ReferenceStats};
use crate::logic::monitoring::{
    AlertDetail, AlertFamily, AlertFilter, AlertType, BehaviorStats, Histogram, MonitorOutcome, Severity,
    SystemStatus, Timeline, HISTOGRAM_BINS, TIMELINE_WINDOWS,
};
use crate::{AppResult, AppState};

/// Probabilities feeding the distribution snapshot
const HISTOGRAM_SAMPLE: usize = 300;
/// Alerts returned per family on the timeline
const ALERT_TIMELINE_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ModelQuery {
    pub model_name: Option<String>,
}

impl ModelQuery {
    fn resolve(self, state: &AppState) -> String {
        self.model_name
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| state.config.model_name.clone())
    }
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
}

impl ModelInfo {
    fn new(name: &str, state: &AppState) -> Self {
        Self {
            name: name.to_string(),
            version: state.config.model_version.clone(),
        }
    }
}

// ============================================================================
// BEHAVIOR
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Thresholds {
    pub mean_shift_std_multiplier: f64,
    pub high_risk_upper: Option<f64>,
    pub high_risk_lower: f64,
}

#[derive(Debug, Serialize)]
pub struct BehaviorResponse {
    pub model: ModelInfo,
    pub baseline_stats: Option<BehaviorStats>,
    pub recent_stats: Option<BehaviorStats>,
    pub thresholds: Thresholds,
    pub distribution_snapshot: Histogram,
    pub time_series: Timeline,
}

/// Baseline vs recent behavior with distribution and trend data
pub async fn behavior(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> AppResult<Json<BehaviorResponse>> {
    let model_name = query.resolve(&state);
    let orchestrator = &state.orchestrator;
    let stores = orchestrator.stores();
    let policy = orchestrator.policy();

    let baseline = stores.baselines.latest_baseline(&model_name).await?;
    let recent = orchestrator.recent_stats(&model_name).await?;

    let sample = stores
        .predictions
        .latest_probabilities(&model_name, HISTOGRAM_SAMPLE)
        .await?;
    let points = stores
        .predictions
        .probabilities_in_window(&model_name, Utc::now() - Duration::hours(1))
        .await?;

    Ok(Json(BehaviorResponse {
        model: ModelInfo::new(&model_name, &state),
        baseline_stats: baseline,
        recent_stats: recent,
        thresholds: Thresholds {
            mean_shift_std_multiplier: policy.mean_std_multiplier,
            high_risk_upper: baseline.as_ref().map(|b| policy.high_risk_upper(b)),
            high_risk_lower: policy.risk_ratio_floor,
        },
        distribution_snapshot: Histogram::compute(&sample, HISTOGRAM_BINS),
        time_series: Timeline::rolling(&points, TIMELINE_WINDOWS),
    }))
}

// ============================================================================
// DRIFT
// ============================================================================

/// Feature-level drift report; failures come back as an `ERROR` summary
pub async fn drift(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> Json<Value> {
    let model_name = query.resolve(&state);

    match state.orchestrator.check_drift(&model_name).await {
        Ok(check) => Json(json!({
            "drift_summary": check.report.summary,
            "feature_drift": check.report.features,
            "reference_window": {
                "source": "training_data_sample",
                "size": check.reference_size,
            },
            "recent_window": {
                "source": "production_predictions",
                "size": check.recent_size,
            },
        })),
        Err(e) => {
            tracing::warn!(model = %model_name, "Drift check failed: {}", e);
            Json(json!({
                "error": e.to_string(),
                "drift_summary": {
                    "total_features": 0,
                    "drifted_features": 0,
                    "insufficient_features": 0,
                    "drift_ratio": 0.0,
                    "status": "ERROR",
                },
                "feature_drift": [],
            }))
        }
    }
}

// ============================================================================
// ALERTS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AlertView {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub alert_type: AlertType,
    pub category: AlertFamily,
    pub severity: Severity,
    pub message: String,
    pub status: &'static str,
    pub detail: AlertDetail,
}

#[derive(Debug, Serialize)]
pub struct AlertStatistics {
    pub last_24_hours: i64,
    pub last_7_days: i64,
    pub by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct LastHealthyState {
    pub timestamp: DateTime<Utc>,
    pub baseline_snapshot: Option<BehaviorStats>,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertView>,
    pub alert_statistics: AlertStatistics,
    pub last_healthy_state: LastHealthyState,
}

/// Alert timeline and audit statistics
pub async fn alerts(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> AppResult<Json<AlertsResponse>> {
    let model_name = query.resolve(&state);
    let stores = state.orchestrator.stores();

    let records = stores.alerts.recent_alerts(&model_name, ALERT_TIMELINE_LIMIT).await?;
    let last_24_hours = stores
        .alerts
        .count_since(&model_name, &AlertFilter::All, Duration::hours(24))
        .await?;
    let last_7_days = stores
        .alerts
        .count_since(&model_name, &AlertFilter::All, Duration::days(7))
        .await?;
    let baseline = stores.baselines.latest_baseline(&model_name).await?;

    let mut by_type = BTreeMap::new();
    for record in &records {
        *by_type.entry(record.alert_type.as_str().to_string()).or_insert(0) += 1;
    }

    let alerts = records
        .into_iter()
        .map(|record| AlertView {
            id: record.id,
            timestamp: record.created_at,
            alert_type: record.alert_type,
            category: record.alert_type.family(),
            severity: record.alert_type.severity(),
            message: record.alert_type.description().to_string(),
            status: "ACTIVE",
            detail: record.detail,
        })
        .collect();

    Ok(Json(AlertsResponse {
        alerts,
        alert_statistics: AlertStatistics {
            last_24_hours,
            last_7_days,
            by_type,
        },
        last_healthy_state: LastHealthyState {
            timestamp: Utc::now(),
            baseline_snapshot: baseline,
        },
    }))
}

// ============================================================================
// OVERVIEW
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LastPrediction {
    pub timestamp: DateTime<Utc>,
    pub fraud_probability: f64,
    pub prediction_entropy: f64,
}

#[derive(Debug, Serialize)]
pub struct ActiveAlerts {
    pub data_drift: i64,
    pub behavior_shift: i64,
    pub confidence: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct MonitoringCoverage {
    pub data_drift: bool,
    pub silent_failure: bool,
    pub background_monitoring: bool,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub model: ModelInfo,
    pub status: SystemStatus,
    pub last_prediction: Option<LastPrediction>,
    pub active_alerts: ActiveAlerts,
    pub monitoring_coverage: MonitoringCoverage,
    pub total_predictions_logged: i64,
}

/// Dashboard landing summary; alerts from the last 24 hours count as active
pub async fn overview(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> AppResult<Json<OverviewResponse>> {
    let model_name = query.resolve(&state);
    let stores = state.orchestrator.stores();
    let window = Duration::hours(24);

    let last = stores.predictions.latest_record(&model_name).await?;
    let confidence = stores
        .alerts
        .count_since(&model_name, &AlertFilter::Family(AlertFamily::Confidence), window)
        .await?;
    let behavior_shift = stores
        .alerts
        .count_since(&model_name, &AlertFilter::Family(AlertFamily::ModelBehavior), window)
        .await?;
    let total_predictions_logged = stores.predictions.count(&model_name).await?;

    // Drift reports are not persisted, so they never count as active alerts
    let data_drift = 0;
    let total = confidence + behavior_shift + data_drift;

    Ok(Json(OverviewResponse {
        model: ModelInfo::new(&model_name, &state),
        status: SystemStatus::from_alert_count(total),
        last_prediction: last.map(|r| LastPrediction {
            timestamp: r.created_at,
            fraud_probability: r.probability,
            prediction_entropy: r.entropy,
        }),
        active_alerts: ActiveAlerts {
            data_drift,
            behavior_shift,
            confidence,
            total,
        },
        monitoring_coverage: MonitoringCoverage {
            data_drift: true,
            silent_failure: true,
            background_monitoring: state.config.monitor_interval().is_some(),
        },
        total_predictions_logged,
    }))
}

// ============================================================================
// MANUAL RUN / STATUS / REFERENCE
// ============================================================================

/// Run behavior monitoring now
pub async fn run(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> Json<MonitorOutcome> {
    let model_name = query.resolve(&state);
    Json(state.orchestrator.run(&model_name).await)
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub endpoint: &'static str,
    pub model: ModelInfo,
    pub model_backend: String,
    pub schema_fingerprint: String,
    pub feature_count: usize,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let schema = state.orchestrator.transformer().schema();

    Json(StatusResponse {
        service: "behavior_monitoring",
        status: "operational",
        endpoint: "/api/run",
        model: ModelInfo::new(&state.config.model_name, &state),
        model_backend: state.predictor.model().describe(),
        schema_fingerprint: schema.fingerprint().to_string(),
        feature_count: schema.feature_count(),
    })
}

/// Reference statistics: the saved artifact when configured, else computed
/// from the reference sample
pub async fn reference(State(state): State<AppState>) -> AppResult<Json<ReferenceStats>> {
    let stats = match state.config.reference_stats_path.clone() {
        Some(path) => tokio::task::spawn_blocking(move || load_reference_stats(&path))
            .await
            .map_err(ReferenceError::from)??,
        None => compute_reference_stats(&*state.orchestrator.reference_matrix().await?),
    };
    Ok(Json(stats))
}
