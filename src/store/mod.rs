//! Store Module - persistence seams of the monitoring engine
//!
//! The engine never talks to a database directly. It appends and reads
//! through three traits:
//! - `PredictionStore`: append-only prediction log
//! - `BaselineStore`: latest known-healthy behavior snapshot
//! - `AlertStore`: append-only alert log
//!
//! `PgStore` backs all three with PostgreSQL; `InMemoryStore` backs them
//! with process memory for tests and database-less runs.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use axum::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::logic::monitoring::{AlertFilter, AlertRecord, AlertType, BehaviorStats};
use crate::models::{PredictionRecord, ProbabilityPoint};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn append(&self, record: &PredictionRecord) -> StoreResult<()>;

    /// Newest first
    async fn latest_probabilities(&self, model_name: &str, limit: usize) -> StoreResult<Vec<f64>>;

    async fn latest_record(&self, model_name: &str) -> StoreResult<Option<PredictionRecord>>;

    async fn count(&self, model_name: &str) -> StoreResult<i64>;

    /// Oldest first
    async fn probabilities_in_window(
        &self,
        model_name: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ProbabilityPoint>>;

    /// Raw input payloads, newest first
    async fn recent_payloads(&self, model_name: &str, limit: usize) -> StoreResult<Vec<serde_json::Value>>;
}

#[async_trait]
pub trait BaselineStore: Send + Sync {
    async fn latest_baseline(&self, model_name: &str) -> StoreResult<Option<BehaviorStats>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn append_confidence_alert(
        &self,
        model_name: &str,
        alert_type: AlertType,
        probability: f64,
        entropy: f64,
    ) -> StoreResult<()>;

    async fn append_behavior_alert(
        &self,
        model_name: &str,
        alert_type: AlertType,
        baseline: &BehaviorStats,
        recent: &BehaviorStats,
    ) -> StoreResult<()>;

    async fn count_since(&self, model_name: &str, filter: &AlertFilter, window: Duration) -> StoreResult<i64>;

    /// Up to `limit` alerts of each family, merged newest first
    async fn recent_alerts(&self, model_name: &str, limit: usize) -> StoreResult<Vec<AlertRecord>>;
}

/// The three store handles the engine is wired with
#[derive(Clone)]
pub struct Stores {
    pub predictions: Arc<dyn PredictionStore>,
    pub baselines: Arc<dyn BaselineStore>,
    pub alerts: Arc<dyn AlertStore>,
}

impl Stores {
    /// Use one backend for all three roles
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: PredictionStore + BaselineStore + AlertStore + 'static,
    {
        Self {
            predictions: store.clone(),
            baselines: store.clone(),
            alerts: store,
        }
    }
}
