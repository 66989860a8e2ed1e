//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::logic::drift::ReferenceError;
use crate::logic::inference::PredictError;
use crate::logic::monitoring::DriftCheckError;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),

    // Validation errors
    ValidationError(String),

    // Database errors
    DatabaseError(String),
    ServiceUnavailable(String),

    // Model errors
    ModelError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable")
            }
            AppError::ModelError(msg) => {
                tracing::error!("Model error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Model inference failed")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::DatabaseError(e.to_string()),
            StoreError::Unavailable(msg) => AppError::ServiceUnavailable(msg),
            StoreError::Corrupt(msg) => AppError::InternalError(format!("corrupt record: {}", msg)),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Transform(e) => AppError::ValidationError(e.to_string()),
            PredictError::Model(e) => AppError::ModelError(e.to_string()),
            PredictError::Logging(e) => e.into(),
        }
    }
}

impl From<ReferenceError> for AppError {
    fn from(err: ReferenceError) -> Self {
        match err {
            ReferenceError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                AppError::NotFound("Reference artifact not found".to_string())
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<DriftCheckError> for AppError {
    fn from(err: DriftCheckError) -> Self {
        match err {
            DriftCheckError::Store(e) => e.into(),
            DriftCheckError::NoRecentData(model) => {
                AppError::NotFound(format!("No recent predictions for model '{}'", model))
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::TransformError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (AppError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::ModelError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_predict_error_mapping() {
        let transform = PredictError::Transform(TransformError::NonNumeric {
            field: "amount".into(),
            value: "\"lots\"".into(),
        });
        assert!(matches!(AppError::from(transform), AppError::ValidationError(_)));

        let logging = PredictError::Logging(StoreError::Unavailable("down".into()));
        assert!(matches!(AppError::from(logging), AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_drift_error_mapping() {
        let err = AppError::from(DriftCheckError::NoRecentData("fraud_xgb".into()));
        assert!(matches!(err, AppError::NotFound(msg) if msg.contains("fraud_xgb")));
    }
}
