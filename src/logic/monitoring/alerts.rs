//! Alert vocabulary shared by the rule evaluator, the shift detector and
//! the stores.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stats::BehaviorStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    // Per prediction
    HighPredictionEntropy,
    LowModelConfidence,

    // Per window
    MeanShift,
    RiskRatioShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertFamily {
    Confidence,
    ModelBehavior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Medium,
    High,
}

impl AlertType {
    pub const ALL: [AlertType; 4] = [
        AlertType::HighPredictionEntropy,
        AlertType::LowModelConfidence,
        AlertType::MeanShift,
        AlertType::RiskRatioShift,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::HighPredictionEntropy => "HIGH_PREDICTION_ENTROPY",
            AlertType::LowModelConfidence => "LOW_MODEL_CONFIDENCE",
            AlertType::MeanShift => "MEAN_SHIFT",
            AlertType::RiskRatioShift => "RISK_RATIO_SHIFT",
        }
    }

    pub fn family(&self) -> AlertFamily {
        match self {
            AlertType::HighPredictionEntropy | AlertType::LowModelConfidence => AlertFamily::Confidence,
            AlertType::MeanShift | AlertType::RiskRatioShift => AlertFamily::ModelBehavior,
        }
    }

    pub fn severity(&self) -> Severity {
        match self.family() {
            AlertFamily::Confidence => Severity::Medium,
            AlertFamily::ModelBehavior => Severity::High,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AlertType::HighPredictionEntropy => "Model uncertainty exceeds safe threshold",
            AlertType::LowModelConfidence => "Prediction probability in borderline range (40-60%)",
            AlertType::MeanShift => "Mean fraud probability moved beyond one baseline standard deviation",
            AlertType::RiskRatioShift => "High-risk prediction ratio left its expected band",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown alert type '{0}'")]
pub struct UnknownAlertType(pub String);

impl FromStr for AlertType {
    type Err = UnknownAlertType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownAlertType(s.to_string()))
    }
}

/// Which alerts a count should include
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertFilter {
    All,
    Family(AlertFamily),
    Types(Vec<AlertType>),
}

impl AlertFilter {
    pub fn matches(&self, alert_type: AlertType) -> bool {
        match self {
            AlertFilter::All => true,
            AlertFilter::Family(family) => alert_type.family() == *family,
            AlertFilter::Types(types) => types.contains(&alert_type),
        }
    }

    /// Concrete alert types selected by this filter
    pub fn types(&self) -> Vec<AlertType> {
        AlertType::ALL.into_iter().filter(|t| self.matches(*t)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertDetail {
    Confidence {
        probability: f64,
        entropy: f64,
    },
    ModelBehavior {
        baseline: BehaviorStats,
        recent: BehaviorStats,
    },
}

/// A persisted alert, as read back from a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: i64,
    pub model_name: String,
    pub alert_type: AlertType,
    pub detail: AlertDetail,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_type_round_trips_through_str() {
        for alert_type in AlertType::ALL {
            assert_eq!(alert_type.as_str().parse::<AlertType>(), Ok(alert_type));
        }
        let err = "DATA_DRIFT".parse::<AlertType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown alert type 'DATA_DRIFT'");
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        let json = serde_json::to_string(&AlertType::RiskRatioShift).unwrap();
        assert_eq!(json, "\"RISK_RATIO_SHIFT\"");
    }

    #[test]
    fn test_families_and_severity() {
        assert_eq!(AlertType::LowModelConfidence.family(), AlertFamily::Confidence);
        assert_eq!(AlertType::MeanShift.family(), AlertFamily::ModelBehavior);
        assert_eq!(AlertType::HighPredictionEntropy.severity(), Severity::Medium);
        assert_eq!(AlertType::RiskRatioShift.severity(), Severity::High);
    }

    #[test]
    fn test_filter_selection() {
        let confidence = AlertFilter::Family(AlertFamily::Confidence);
        assert_eq!(
            confidence.types(),
            vec![AlertType::HighPredictionEntropy, AlertType::LowModelConfidence]
        );
        assert_eq!(AlertFilter::All.types().len(), 4);
        assert!(!AlertFilter::Types(vec![AlertType::MeanShift]).matches(AlertType::RiskRatioShift));
    }
}
