//! Prediction handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::logic::inference::Prediction;
use crate::{AppError, AppResult, AppState};

/// One PaySim-style transaction
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictionRequest {
    #[validate(range(min = 0))]
    pub step: i64,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 32))]
    pub transaction_type: String,

    #[validate(range(min = 0.0))]
    pub amount: f64,

    #[serde(rename = "oldbalanceOrg")]
    #[validate(range(min = 0.0))]
    pub old_balance_orig: f64,

    #[serde(rename = "newbalanceOrig")]
    #[validate(range(min = 0.0))]
    pub new_balance_orig: f64,

    #[serde(rename = "oldbalanceDest")]
    #[validate(range(min = 0.0))]
    pub old_balance_dest: f64,

    #[serde(rename = "newbalanceDest")]
    #[validate(range(min = 0.0))]
    pub new_balance_dest: f64,

    #[serde(rename = "isFlaggedFraud")]
    #[validate(range(min = 0, max = 1))]
    pub is_flagged_fraud: i32,

    #[serde(rename = "nameOrig", default, skip_serializing_if = "Option::is_none")]
    pub name_orig: Option<String>,

    #[serde(rename = "nameDest", default, skip_serializing_if = "Option::is_none")]
    pub name_dest: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub success: bool,
}

/// Score a transaction, log it and run the confidence rules
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictionRequest>,
) -> AppResult<Json<PredictionResponse>> {
    req.validate()?;

    let Value::Object(raw) = serde_json::to_value(&req)
        .map_err(|e| AppError::InternalError(e.to_string()))?
    else {
        return Err(AppError::InternalError("request did not serialize to an object".to_string()));
    };

    let prediction = state.predictor.predict(raw).await?;

    Ok(Json(PredictionResponse {
        prediction,
        success: true,
    }))
}
