//! Dashboard aggregates over stored probabilities
//!
//! Pure helpers behind `/api/behavior` and `/api/overview`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stats::BehaviorStats;
use crate::models::ProbabilityPoint;

pub const HISTOGRAM_BINS: usize = 10;
pub const TIMELINE_WINDOWS: usize = 10;

// ============================================================================
// HISTOGRAM
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` edges; empty when there was no data
    pub histogram_bins: Vec<f64>,
    pub histogram_counts: Vec<u64>,
}

impl Histogram {
    /// Equal-width bins over the data range. The last bin is closed on the
    /// right; a zero-width range is widened to ±0.5.
    pub fn compute(values: &[f64], bins: usize) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return Self::default();
        }

        let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0u64; bins];
        for v in finite {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Self {
            histogram_bins: edges,
            histogram_counts: counts,
        }
    }
}

// ============================================================================
// ROLLING TIMELINE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub timestamps: Vec<DateTime<Utc>>,
    pub rolling_mean: Vec<f64>,
    pub rolling_std: Vec<f64>,
    pub high_risk_ratio: Vec<f64>,
}

impl Timeline {
    /// Split oldest-first points into consecutive chunks of
    /// `max(1, len / windows)` and summarize each; the trailing chunk may be
    /// shorter, so there can be one more entry than `windows`.
    pub fn rolling(points: &[ProbabilityPoint], windows: usize) -> Self {
        let mut timeline = Self::default();
        if points.is_empty() {
            return timeline;
        }

        let size = (points.len() / windows.max(1)).max(1);
        for chunk in points.chunks(size) {
            let values: Vec<f64> = chunk.iter().map(|p| p.probability).collect();
            let Ok(stats) = BehaviorStats::compute(&values) else {
                continue;
            };
            timeline.timestamps.push(chunk[0].created_at);
            timeline.rolling_mean.push(stats.mean);
            timeline.rolling_std.push(stats.std);
            timeline.high_risk_ratio.push(stats.high_risk_ratio);
        }

        timeline
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

// ============================================================================
// SYSTEM STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemStatus {
    Healthy,
    Warning,
    Critical,
}

impl SystemStatus {
    pub fn from_alert_count(total: i64) -> Self {
        if total >= 3 {
            SystemStatus::Critical
        } else if total >= 1 {
            SystemStatus::Warning
        } else {
            SystemStatus::Healthy
        }
    }
}
