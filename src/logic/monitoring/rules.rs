//! Per-prediction behavior rules. No ML, no window: each scored event is
//! checked on its own right after inference.

use serde::{Deserialize, Serialize};

use super::alerts::AlertType;

const ENTROPY_EPSILON: f64 = 1e-9;

/// Binary Shannon entropy (nats) of a fraud probability
pub fn prediction_entropy(p: f64) -> f64 {
    -(p * (p + ENTROPY_EPSILON).ln() + (1.0 - p) * (1.0 - p + ENTROPY_EPSILON).ln())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RulePolicy {
    pub entropy_threshold: f64,
    /// Inclusive borderline band
    pub low_confidence_min: f64,
    pub low_confidence_max: f64,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            entropy_threshold: 0.45,
            low_confidence_min: 0.4,
            low_confidence_max: 0.6,
        }
    }
}

impl RulePolicy {
    /// Rules fire independently; entropy is reported first
    pub fn evaluate(&self, probability: f64, entropy: f64) -> Vec<AlertType> {
        let mut alerts = Vec::new();

        if entropy > self.entropy_threshold {
            alerts.push(AlertType::HighPredictionEntropy);
        }

        if (self.low_confidence_min..=self.low_confidence_max).contains(&probability) {
            alerts.push(AlertType::LowModelConfidence);
        }

        alerts
    }
}

/// Evaluate with the default thresholds
pub fn evaluate_behaviour(probability: f64, entropy: f64) -> Vec<AlertType> {
    RulePolicy::default().evaluate(probability, entropy)
}
