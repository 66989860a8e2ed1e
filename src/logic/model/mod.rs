//! Model Module - the fraud scorer behind `/predict`
//!
//! The rest of the engine only sees the `Model` trait: one feature vector
//! in, one fraud probability out. `OnnxModel` is the production
//! implementation; tests plug in stubs.

pub mod onnx;

use std::path::PathBuf;

use thiserror::Error;

use crate::logic::features::FeatureVector;

pub use onnx::OnnxModel;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to load model: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model output has no usable probability")]
    EmptyOutput,

    #[error("model returned an invalid probability: {0}")]
    InvalidScore(f64),
}

pub trait Model: Send + Sync {
    /// Fraud-class probability in [0, 1]
    fn score(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Short human-readable description for status endpoints
    fn describe(&self) -> String;
}

/// Reject NaN, infinities and anything outside [0, 1]
pub fn validate_probability(score: f64) -> Result<f64, ModelError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ModelError::InvalidScore(score))
    }
}
