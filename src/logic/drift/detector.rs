//! Distribution Drift Detector - per-feature KS tests
//!
//! Compares every column of a reference matrix against the same column of a
//! recent matrix and folds the per-feature verdicts into a summary band.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ks::ks_2samp;
use crate::logic::features::FeatureMatrix;

pub const DEFAULT_P_VALUE_THRESHOLD: f64 = 0.05;

/// Fewer finite values than this on either side and the test is undefined
pub const MIN_COLUMN_SAMPLES: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum DriftError {
    #[error(
        "reference and recent columns differ (missing from recent: {missing_in_recent:?}, missing from reference: {missing_in_reference:?})"
    )]
    SchemaMismatch {
        missing_in_recent: Vec<String>,
        missing_in_reference: Vec<String>,
    },
}

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftStatus {
    LowDrift,
    ModerateDrift,
    HighDrift,
}

impl DriftStatus {
    pub fn from_ratio(drift_ratio: f64) -> Self {
        if drift_ratio > 0.7 {
            DriftStatus::HighDrift
        } else if drift_ratio > 0.3 {
            DriftStatus::ModerateDrift
        } else {
            DriftStatus::LowDrift
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test_status", rename_all = "snake_case")]
pub enum FeatureTest {
    Tested {
        statistic: f64,
        p_value: f64,
        drift_detected: bool,
    },
    InsufficientData {
        reference_samples: usize,
        recent_samples: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub feature: String,
    #[serde(flatten)]
    pub test: FeatureTest,
}

impl FeatureDrift {
    pub fn drift_detected(&self) -> bool {
        matches!(self.test, FeatureTest::Tested { drift_detected: true, .. })
    }

    pub fn p_value(&self) -> Option<f64> {
        match self.test {
            FeatureTest::Tested { p_value, .. } => Some(p_value),
            FeatureTest::InsufficientData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub total_features: usize,
    pub drifted_features: usize,
    pub insufficient_features: usize,
    pub drift_ratio: f64,
    pub status: DriftStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub features: Vec<FeatureDrift>,
    pub summary: DriftSummary,
}

impl DriftReport {
    pub fn feature(&self, name: &str) -> Option<&FeatureDrift> {
        self.features.iter().find(|f| f.feature == name)
    }

    pub fn drifted(&self) -> impl Iterator<Item = &FeatureDrift> {
        self.features.iter().filter(|f| f.drift_detected())
    }
}

// ============================================================================
// DETECTOR
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct DistributionDriftDetector {
    p_value_threshold: f64,
}

impl Default for DistributionDriftDetector {
    fn default() -> Self {
        Self::new(DEFAULT_P_VALUE_THRESHOLD)
    }
}

impl DistributionDriftDetector {
    pub fn new(p_value_threshold: f64) -> Self {
        Self { p_value_threshold }
    }

    pub fn p_value_threshold(&self) -> f64 {
        self.p_value_threshold
    }

    pub fn detect(&self, reference: &FeatureMatrix, recent: &FeatureMatrix) -> Result<DriftReport, DriftError> {
        check_columns(reference, recent)?;

        let features: Vec<FeatureDrift> = reference
            .columns()
            .iter()
            .map(|name| FeatureDrift {
                feature: name.clone(),
                test: self.test_column(finite_column(reference, name), finite_column(recent, name)),
            })
            .collect();

        let total_features = features.len();
        let drifted_features = features.iter().filter(|f| f.drift_detected()).count();
        let insufficient_features = features
            .iter()
            .filter(|f| matches!(f.test, FeatureTest::InsufficientData { .. }))
            .count();
        let drift_ratio = if total_features == 0 {
            0.0
        } else {
            drifted_features as f64 / total_features as f64
        };

        Ok(DriftReport {
            features,
            summary: DriftSummary {
                total_features,
                drifted_features,
                insufficient_features,
                drift_ratio,
                status: DriftStatus::from_ratio(drift_ratio),
            },
        })
    }

    fn test_column(&self, reference: Vec<f64>, recent: Vec<f64>) -> FeatureTest {
        if reference.len() < MIN_COLUMN_SAMPLES || recent.len() < MIN_COLUMN_SAMPLES {
            return FeatureTest::InsufficientData {
                reference_samples: reference.len(),
                recent_samples: recent.len(),
            };
        }

        let result = ks_2samp(&reference, &recent);
        FeatureTest::Tested {
            statistic: result.statistic,
            p_value: result.p_value,
            drift_detected: result.p_value < self.p_value_threshold,
        }
    }
}

fn check_columns(reference: &FeatureMatrix, recent: &FeatureMatrix) -> Result<(), DriftError> {
    let reference_set: HashSet<&str> = reference.columns().iter().map(String::as_str).collect();
    let recent_set: HashSet<&str> = recent.columns().iter().map(String::as_str).collect();

    if reference_set == recent_set {
        return Ok(());
    }

    let mut missing_in_recent: Vec<String> =
        reference_set.difference(&recent_set).map(|s| s.to_string()).collect();
    let mut missing_in_reference: Vec<String> =
        recent_set.difference(&reference_set).map(|s| s.to_string()).collect();
    missing_in_recent.sort();
    missing_in_reference.sort();

    Err(DriftError::SchemaMismatch {
        missing_in_recent,
        missing_in_reference,
    })
}

/// Finite values of one column, widened to f64
fn finite_column(matrix: &FeatureMatrix, name: &str) -> Vec<f64> {
    let mut values: Vec<f64> = matrix
        .column(name)
        .map(|col| col.iter().filter(|v| v.is_finite()).map(|&v| v as f64).collect())
        .unwrap_or_default();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    values
}
