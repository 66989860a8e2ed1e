//! ONNX Runtime model
//!
//! Expects a classifier taking a `(1, n_features)` f32 tensor. The fraud
//! probability is read from the configured output, else an output named
//! `probabilities`, else the last output:
//! - 2 values per row → class 1 (fraud)
//! - 1 value per row → that value

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::{validate_probability, Model, ModelError};
use crate::logic::features::FeatureVector;

const PROBABILITIES_OUTPUT: &str = "probabilities";

pub struct OnnxModel {
    session: Mutex<Session>,
    output_name: String,
    path: String,
}

impl OnnxModel {
    pub fn load(path: &Path, output: Option<&str>) -> Result<Self, ModelError> {
        tracing::info!("Loading ONNX model from: {}", path.display());

        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Load(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Load(format!("optimization level: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| ModelError::Load(e.to_string()))?;

        let names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let output_name = pick_output(&names, output)?;

        tracing::info!(output = %output_name, "ONNX model loaded");

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            path: path.display().to_string(),
        })
    }
}

impl Model for OnnxModel {
    fn score(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let input = Array2::<f32>::from_shape_vec((1, features.len()), features.as_slice().to_vec())
            .map_err(|e| ModelError::Inference(format!("input shape: {}", e)))?;
        let tensor = Value::from_array(input).map_err(|e| ModelError::Inference(format!("tensor: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let output = outputs.get(&self.output_name).ok_or(ModelError::EmptyOutput)?;
        let extracted = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("extract: {}", e)))?;

        validate_probability(fraud_probability(extracted.1)?)
    }

    fn describe(&self) -> String {
        format!("onnx:{} ({})", self.path, self.output_name)
    }
}

fn pick_output(names: &[String], requested: Option<&str>) -> Result<String, ModelError> {
    if let Some(requested) = requested {
        return names
            .iter()
            .find(|n| n.as_str() == requested)
            .cloned()
            .ok_or_else(|| ModelError::Load(format!("model has no output named '{}'", requested)));
    }

    names
        .iter()
        .find(|n| n.as_str() == PROBABILITIES_OUTPUT)
        .or_else(|| names.last())
        .cloned()
        .ok_or_else(|| ModelError::Load("model defines no outputs".to_string()))
}

/// Fraud probability of the single scored row
fn fraud_probability(data: &[f32]) -> Result<f64, ModelError> {
    match data {
        [p] => Ok(*p as f64),
        [_, fraud] => Ok(*fraud as f64),
        _ => Err(ModelError::EmptyOutput),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_output() {
        let outputs = names(&["label", "probabilities"]);
        assert_eq!(pick_output(&outputs, None).unwrap(), "probabilities");
        assert_eq!(pick_output(&outputs, Some("label")).unwrap(), "label");
        assert!(pick_output(&outputs, Some("scores")).is_err());
        assert_eq!(pick_output(&names(&["variable"]), None).unwrap(), "variable");
        assert!(pick_output(&[], None).is_err());
    }

    #[test]
    fn test_fraud_probability_layouts() {
        assert_eq!(fraud_probability(&[0.25]).unwrap(), 0.25);
        assert_eq!(fraud_probability(&[0.75, 0.25]).unwrap(), 0.25);
        assert!(matches!(fraud_probability(&[]), Err(ModelError::EmptyOutput)));
        assert!(matches!(fraud_probability(&[0.1, 0.2, 0.7]), Err(ModelError::EmptyOutput)));
    }

    #[test]
    fn test_missing_model_file() {
        let err = OnnxModel::load(Path::new("/nonexistent/base_model.onnx"), None).err().unwrap();
        assert!(matches!(err, ModelError::NotFound(_)));
    }
}
