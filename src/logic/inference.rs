//! Prediction Service - one scored transaction end to end
//!
//! transform → score → entropy → log prediction → confidence rules → alerts
//!
//! Logging the prediction is required: if it fails the request fails.
//! Confidence alerts are best effort and only warn.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::features::{FeatureTransformer, TransformError};
use super::model::{Model, ModelError};
use super::monitoring::{prediction_entropy, AlertType, RulePolicy};
use crate::models::PredictionRecord;
use crate::store::{AlertStore, PredictionStore, StoreError};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid input: {0}")]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to log prediction: {0}")]
    Logging(#[source] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub fraud_probability: f64,
    pub decision: bool,
    pub entropy: f64,
    pub alerts: Vec<AlertType>,
}

pub struct PredictionService {
    model_name: String,
    model_version: String,
    transformer: Arc<FeatureTransformer>,
    model: Arc<dyn Model>,
    predictions: Arc<dyn PredictionStore>,
    alerts: Arc<dyn AlertStore>,
    rules: RulePolicy,
}

impl PredictionService {
    pub fn new(
        model_name: impl Into<String>,
        model_version: impl Into<String>,
        transformer: Arc<FeatureTransformer>,
        model: Arc<dyn Model>,
        predictions: Arc<dyn PredictionStore>,
        alerts: Arc<dyn AlertStore>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            model_version: model_version.into(),
            transformer,
            model,
            predictions,
            alerts,
            rules: RulePolicy::default(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    pub async fn predict(&self, raw: Map<String, Value>) -> Result<Prediction, PredictError> {
        let features = self.transformer.transform(&raw)?;
        let probability = self.model.score(&features)?;
        let entropy = prediction_entropy(probability);

        let record = PredictionRecord::new(
            &self.model_name,
            &self.model_version,
            Value::Object(raw),
            probability,
            entropy,
        );
        self.predictions
            .append(&record)
            .await
            .map_err(PredictError::Logging)?;

        let alerts = self.rules.evaluate(probability, entropy);
        for alert_type in &alerts {
            if let Err(e) = self
                .alerts
                .append_confidence_alert(&self.model_name, *alert_type, probability, entropy)
                .await
            {
                tracing::warn!(alert = %alert_type, "Failed to log confidence alert: {}", e);
            }
        }

        tracing::debug!(probability, entropy, alerts = alerts.len(), "Prediction logged");

        Ok(Prediction {
            fraud_probability: probability,
            decision: record.decision,
            entropy,
            alerts,
        })
    }
}
