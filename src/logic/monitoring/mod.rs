//! Monitoring Module - label-free model behavior monitoring
//!
//! # Architecture
//! - `stats.rs`: `BehaviorStats` over a probability window
//! - `shift.rs`: silent shift detection (baseline vs recent)
//! - `rules.rs`: per-prediction confidence rules
//! - `alerts.rs`: alert taxonomy and records
//! - `runner.rs`: `MonitoringOrchestrator` (behavior runs, drift checks)
//! - `dashboard.rs`: histogram / timeline / status aggregates
//! - `scheduler.rs`: background run loop

pub mod alerts;
pub mod dashboard;
pub mod rules;
pub mod runner;
pub mod scheduler;
pub mod shift;
pub mod stats;
#[cfg(test)]
mod tests;

pub use alerts::{AlertDetail, AlertFamily, AlertFilter, AlertRecord, AlertType, Severity, UnknownAlertType};
pub use dashboard::{Histogram, SystemStatus, Timeline, HISTOGRAM_BINS, TIMELINE_WINDOWS};
pub use rules::{evaluate_behaviour, prediction_entropy, RulePolicy};
pub use runner::{DriftCheck, DriftCheckError, MonitorConfig, MonitorOutcome, MonitoringOrchestrator, SkipReason};
pub use scheduler::spawn_monitor_loop;
pub use shift::{detect_silent_shift, ShiftPolicy, ShiftType};
pub use stats::{BehaviorStats, InsufficientDataError, HIGH_RISK_PROBABILITY};
