//! Monitoring Orchestrator - one behavior run per call
//!
//! LOAD_BASELINE → LOAD_RECENT → COMPUTE → DECIDE → ALERT | HEALTHY
//!
//! `run` never returns an error: store failures become an `Error` outcome so
//! the background loop has something to log. `check_drift` is interactive
//! and propagates its errors.
//!
//! The reference sample is read and transformed once, on a blocking thread,
//! the first time it is needed. A failed load is not cached.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::Instrument;
use uuid::Uuid;

use super::shift::{ShiftPolicy, ShiftType};
use super::stats::BehaviorStats;
use crate::logic::drift::{DistributionDriftDetector, DriftError, DriftReport, ReferenceDataSource, ReferenceError};
use crate::logic::features::{FeatureMatrix, FeatureTransformer, TransformError};
use crate::store::{StoreError, Stores};

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Latest N probabilities forming the recent window
    pub recent_window: usize,
    /// Below this many recent predictions the run is skipped
    pub min_samples: usize,
    /// Latest K payloads compared against the reference sample
    pub drift_sample_limit: usize,
    pub drift_p_value: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            recent_window: 50,
            min_samples: 10,
            drift_sample_limit: 300,
            drift_p_value: 0.05,
        }
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    BaselineNotFound,
    NotEnoughData,
}

/// Terminal state of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonitorOutcome {
    Skipped {
        model_name: String,
        reason: SkipReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_count: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        required: Option<usize>,
    },
    AlertTriggered {
        model_name: String,
        reason: ShiftType,
        baseline: BehaviorStats,
        recent: BehaviorStats,
    },
    Healthy {
        model_name: String,
        baseline: BehaviorStats,
        recent: BehaviorStats,
    },
    Error {
        model_name: String,
        error: String,
    },
}

impl MonitorOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            MonitorOutcome::Skipped { .. } => "skipped",
            MonitorOutcome::AlertTriggered { .. } => "alert_triggered",
            MonitorOutcome::Healthy { .. } => "healthy",
            MonitorOutcome::Error { .. } => "error",
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            MonitorOutcome::Skipped { model_name, .. }
            | MonitorOutcome::AlertTriggered { model_name, .. }
            | MonitorOutcome::Healthy { model_name, .. }
            | MonitorOutcome::Error { model_name, .. } => model_name,
        }
    }
}

// ============================================================================
// DRIFT CHECK
// ============================================================================

#[derive(Debug, Error)]
pub enum DriftCheckError {
    #[error("reference data unavailable: {0}")]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("recent payload could not be transformed: {0}")]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Drift(#[from] DriftError),

    #[error("no recent predictions for model '{0}'")]
    NoRecentData(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftCheck {
    pub report: DriftReport,
    pub reference_size: usize,
    pub recent_size: usize,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct MonitoringOrchestrator {
    stores: Stores,
    transformer: Arc<FeatureTransformer>,
    reference: Arc<dyn ReferenceDataSource>,
    reference_matrix: OnceCell<Arc<FeatureMatrix>>,
    detector: DistributionDriftDetector,
    policy: ShiftPolicy,
    config: MonitorConfig,
}

impl MonitoringOrchestrator {
    pub fn new(
        stores: Stores,
        transformer: Arc<FeatureTransformer>,
        reference: Arc<dyn ReferenceDataSource>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            stores,
            transformer,
            reference,
            reference_matrix: OnceCell::new(),
            detector: DistributionDriftDetector::new(config.drift_p_value),
            policy: ShiftPolicy::default(),
            config,
        }
    }

    pub fn with_policy(mut self, policy: ShiftPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn policy(&self) -> &ShiftPolicy {
        &self.policy
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    /// Transformed reference sample, loaded on first use
    pub async fn reference_matrix(&self) -> Result<Arc<FeatureMatrix>, ReferenceError> {
        let matrix = self
            .reference_matrix
            .get_or_try_init(|| async {
                let source = self.reference.clone();
                let matrix = tokio::task::spawn_blocking(move || source.load()).await??;
                tracing::info!(rows = matrix.nrows(), "Reference sample loaded");
                Ok::<_, ReferenceError>(Arc::new(matrix))
            })
            .await?;
        Ok(matrix.clone())
    }

    /// Run one behavior check for `model_name`
    pub async fn run(&self, model_name: &str) -> MonitorOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("monitor_run", model = %model_name, %run_id);

        async {
            let outcome = match self.try_run(model_name).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Monitoring run failed: {}", e);
                    return MonitorOutcome::Error {
                        model_name: model_name.to_string(),
                        error: e.to_string(),
                    };
                }
            };

            match &outcome {
                MonitorOutcome::AlertTriggered { reason, recent, .. } => {
                    tracing::warn!(?reason, recent_mean = recent.mean, "Behavior shift detected");
                }
                MonitorOutcome::Skipped { reason, .. } => {
                    tracing::info!(?reason, "Monitoring run skipped");
                }
                _ => tracing::info!("Model behavior healthy"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn try_run(&self, model_name: &str) -> Result<MonitorOutcome, StoreError> {
        let Some(baseline) = self.stores.baselines.latest_baseline(model_name).await? else {
            return Ok(MonitorOutcome::Skipped {
                model_name: model_name.to_string(),
                reason: SkipReason::BaselineNotFound,
                data_count: None,
                required: None,
            });
        };

        let probabilities = self
            .stores
            .predictions
            .latest_probabilities(model_name, self.config.recent_window)
            .await?;

        let not_enough = || MonitorOutcome::Skipped {
            model_name: model_name.to_string(),
            reason: SkipReason::NotEnoughData,
            data_count: Some(probabilities.len()),
            required: Some(self.config.min_samples),
        };

        if probabilities.len() < self.config.min_samples {
            return Ok(not_enough());
        }
        let Ok(recent) = BehaviorStats::compute(&probabilities) else {
            return Ok(not_enough());
        };

        match self.policy.detect(&baseline, &recent) {
            Some(shift) => {
                self.stores
                    .alerts
                    .append_behavior_alert(model_name, shift.into(), &baseline, &recent)
                    .await?;
                Ok(MonitorOutcome::AlertTriggered {
                    model_name: model_name.to_string(),
                    reason: shift,
                    baseline,
                    recent,
                })
            }
            None => Ok(MonitorOutcome::Healthy {
                model_name: model_name.to_string(),
                baseline,
                recent,
            }),
        }
    }

    /// Stats over the configured recent window, `None` when it is empty
    pub async fn recent_stats(&self, model_name: &str) -> Result<Option<BehaviorStats>, StoreError> {
        let probabilities = self
            .stores
            .predictions
            .latest_probabilities(model_name, self.config.recent_window)
            .await?;
        Ok(BehaviorStats::compute(&probabilities).ok())
    }

    /// Compare the reference sample against the latest stored payloads
    pub async fn check_drift(&self, model_name: &str) -> Result<DriftCheck, DriftCheckError> {
        let reference = self.reference_matrix().await?;

        let payloads = self
            .stores
            .predictions
            .recent_payloads(model_name, self.config.drift_sample_limit)
            .await?;
        if payloads.is_empty() {
            return Err(DriftCheckError::NoRecentData(model_name.to_string()));
        }

        let recent = self.transformer.transform_values(&payloads)?;
        let report = self.detector.detect(&reference, &recent)?;

        tracing::debug!(
            model = %model_name,
            drifted = report.summary.drifted_features,
            total = report.summary.total_features,
            "Drift check complete"
        );

        Ok(DriftCheck {
            report,
            reference_size: reference.nrows(),
            recent_size: recent.nrows(),
        })
    }
}
