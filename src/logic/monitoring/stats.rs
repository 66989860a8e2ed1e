//! Behavior statistics over a window of fraud probabilities

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Probabilities strictly above this count as high risk
pub const HIGH_RISK_PROBABILITY: f64 = 0.8;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot compute behavior statistics over an empty window")]
pub struct InsufficientDataError;

/// `{mean, std, high_risk_ratio}` snapshot of a probability window.
///
/// Used both for the persisted baseline and for the recomputed recent
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorStats {
    pub mean: f64,
    /// Population standard deviation (divides by N)
    pub std: f64,
    pub high_risk_ratio: f64,
}

impl BehaviorStats {
    pub fn compute(probabilities: &[f64]) -> Result<Self, InsufficientDataError> {
        if probabilities.is_empty() {
            return Err(InsufficientDataError);
        }

        let n = probabilities.len() as f64;
        let mean = probabilities.iter().sum::<f64>() / n;
        let variance = probabilities
            .iter()
            .map(|p| (p - mean).powi(2))
            .sum::<f64>()
            / n;
        let high_risk = probabilities
            .iter()
            .filter(|p| **p > HIGH_RISK_PROBABILITY)
            .count();

        Ok(Self {
            mean,
            std: variance.sqrt(),
            high_risk_ratio: high_risk as f64 / n,
        })
    }
}
