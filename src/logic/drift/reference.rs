//! Reference data - the training-time sample drift is measured against
//!
//! `JsonReferenceFile` reads a JSON array of raw row objects and pushes them
//! through the same `FeatureTransformer` live traffic uses, so both sides of
//! a drift test share one column layout.
//!
//! The reference statistics artifact is a flat feature → summary mapping
//! kept for offline inspection; detection never reads it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::logic::features::{FeatureMatrix, FeatureTransformer, TransformError};

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to access reference data: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid reference JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reference dataset is empty")]
    Empty,

    #[error("reference row could not be transformed: {0}")]
    Transform(#[from] TransformError),

    #[error("reference load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub trait ReferenceDataSource: Send + Sync {
    fn load(&self) -> Result<FeatureMatrix, ReferenceError>;
}

// ============================================================================
// SOURCES
// ============================================================================

pub struct JsonReferenceFile {
    path: PathBuf,
    transformer: Arc<FeatureTransformer>,
}

impl JsonReferenceFile {
    pub fn new(path: impl Into<PathBuf>, transformer: Arc<FeatureTransformer>) -> Self {
        Self {
            path: path.into(),
            transformer,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceDataSource for JsonReferenceFile {
    fn load(&self) -> Result<FeatureMatrix, ReferenceError> {
        let content = fs::read_to_string(&self.path)?;
        let rows: Vec<Map<String, Value>> = serde_json::from_str(&content)?;
        if rows.is_empty() {
            return Err(ReferenceError::Empty);
        }

        Ok(self.transformer.transform_many(&rows)?)
    }
}

/// Already-transformed reference matrix held in memory
pub struct StaticReference {
    matrix: FeatureMatrix,
}

impl StaticReference {
    pub fn new(matrix: FeatureMatrix) -> Self {
        Self { matrix }
    }
}

impl ReferenceDataSource for StaticReference {
    fn load(&self) -> Result<FeatureMatrix, ReferenceError> {
        if self.matrix.is_empty() {
            return Err(ReferenceError::Empty);
        }
        Ok(self.matrix.clone())
    }
}

// ============================================================================
// REFERENCE STATISTICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q10: f64,
    pub q25: f64,
    pub q75: f64,
    pub q90: f64,
    pub count: usize,
}

impl FeatureSummary {
    /// Summary of the finite values; sample std (n - 1), 0 below two values
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        if count == 0 {
            return Self {
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
                median: 0.0,
                q10: 0.0,
                q25: 0.0,
                q75: 0.0,
                q90: 0.0,
                count,
            };
        }

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            0.0
        };

        Self {
            mean,
            std,
            min: sorted[0],
            max: sorted[count - 1],
            median: quantile(&sorted, 0.5),
            q10: quantile(&sorted, 0.1),
            q25: quantile(&sorted, 0.25),
            q75: quantile(&sorted, 0.75),
            q90: quantile(&sorted, 0.9),
            count,
        }
    }
}

pub type ReferenceStats = BTreeMap<String, FeatureSummary>;

/// Linear interpolation between closest ranks of a sorted, non-empty slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn compute_reference_stats(matrix: &FeatureMatrix) -> ReferenceStats {
    matrix
        .columns()
        .iter()
        .filter_map(|name| {
            let column = matrix.column(name)?;
            Some((name.clone(), FeatureSummary::from_values(column.iter().map(|&v| v as f64))))
        })
        .collect()
}

pub fn save_reference_stats(stats: &ReferenceStats, path: &Path) -> Result<(), ReferenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_vec_pretty(stats)?)?;
    Ok(())
}

pub fn load_reference_stats(path: &Path) -> Result<ReferenceStats, ReferenceError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::FeatureSchema;
    use ndarray::Array2;
    use std::io::Write;

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

    #[test]
    fn test_json_reference_file_loads_through_transformer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"nameOrig": "C1", "type": "PAYMENT", "amount": 10.5}},
                {{"nameOrig": "C2", "type": "CASH_OUT", "amount": "200"}}
            ]"#
        )
        .unwrap();

        let source = JsonReferenceFile::new(file.path(), transformer());
        let matrix = source.load().unwrap();

        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.columns(), &["amount", "type_CASH_OUT", "type_PAYMENT"]);
        assert_eq!(matrix.column("amount").unwrap().to_vec(), vec![10.5, 200.0]);
        assert_eq!(matrix.column("type_PAYMENT").unwrap().to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_empty_reference_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let source = JsonReferenceFile::new(file.path(), transformer());
        assert!(matches!(source.load(), Err(ReferenceError::Empty)));

        let empty = FeatureMatrix::new(vec!["amount".to_string()], Array2::zeros((0, 1))).unwrap();
        assert!(matches!(StaticReference::new(empty).load(), Err(ReferenceError::Empty)));
    }

    #[test]
    fn test_missing_reference_file() {
        let source = JsonReferenceFile::new("/nonexistent/reference.json", transformer());
        assert!(matches!(source.load(), Err(ReferenceError::Io(_))));
    }

    #[test]
    fn test_feature_summary() {
        let summary = FeatureSummary::from_values([1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN]);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, 3.0);
        assert!((summary.std - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.median, 3.0);
        assert!((summary.q10 - 1.4).abs() < 1e-12);
        assert_eq!(summary.q25, 2.0);
        assert_eq!(summary.q75, 4.0);
        assert!((summary.q90 - 4.6).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_summary() {
        let summary = FeatureSummary::from_values([7.0]);
        assert_eq!(summary.std, 0.0);
        assert_eq!(summary.median, 7.0);
        assert_eq!(summary.q90, 7.0);
    }

    #[test]
    fn test_stats_artifact_round_trip() {
        let data = Array2::from_shape_vec((3, 2), vec![1.0, 0.0, 2.0, 1.0, 3.0, 0.0]).unwrap();
        let matrix = FeatureMatrix::new(vec!["amount".to_string(), "type_PAYMENT".to_string()], data).unwrap();
        let stats = compute_reference_stats(&matrix);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts").join("reference_stats.json");
        save_reference_stats(&stats, &path).unwrap();

        let loaded = load_reference_stats(&path).unwrap();
        assert_eq!(loaded, stats);
        assert_eq!(loaded["amount"].mean, 2.0);
        assert_eq!(loaded["type_PAYMENT"].count, 3);
    }
}
