//! Silent shift detection - baseline vs recent behavior snapshot
//!
//! Two ordered checks, first match wins:
//! - mean shift: the recent mean left the baseline's one-std band
//! - risk-ratio shift: the high-risk ratio rose above 1.5x baseline, or fell
//!   under an absolute 0.30 floor

use serde::{Deserialize, Serialize};

use super::alerts::AlertType;
use super::stats::BehaviorStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftType {
    MeanShift,
    RiskRatioShift,
}

impl From<ShiftType> for AlertType {
    fn from(shift: ShiftType) -> Self {
        match shift {
            ShiftType::MeanShift => AlertType::MeanShift,
            ShiftType::RiskRatioShift => AlertType::RiskRatioShift,
        }
    }
}

/// Shift thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftPolicy {
    /// Mean shift fires beyond `baseline.std * mean_std_multiplier`
    pub mean_std_multiplier: f64,

    /// Upper risk bound relative to the baseline ratio
    pub risk_ratio_multiplier: f64,

    /// Absolute lower risk bound
    pub risk_ratio_floor: f64,
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        Self {
            mean_std_multiplier: 1.0,
            risk_ratio_multiplier: 1.5,
            risk_ratio_floor: 0.30,
        }
    }
}

impl ShiftPolicy {
    pub fn high_risk_upper(&self, baseline: &BehaviorStats) -> f64 {
        baseline.high_risk_ratio * self.risk_ratio_multiplier
    }

    pub fn detect(&self, baseline: &BehaviorStats, recent: &BehaviorStats) -> Option<ShiftType> {
        if (recent.mean - baseline.mean).abs() > baseline.std * self.mean_std_multiplier {
            return Some(ShiftType::MeanShift);
        }

        if recent.high_risk_ratio > self.high_risk_upper(baseline)
            || recent.high_risk_ratio < self.risk_ratio_floor
        {
            return Some(ShiftType::RiskRatioShift);
        }

        None
    }
}

/// Detect with the default policy
pub fn detect_silent_shift(baseline: &BehaviorStats, recent: &BehaviorStats) -> Option<ShiftType> {
    ShiftPolicy::default().detect(baseline, recent)
}
