//! Mapping from domain errors to HTTP responses.
//!
//! Every error body is JSON with an `error` or `message` key. Storage and
//! predictor failures are logged here and reported without internal detail.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::StoreError;
use crate::predictor::PredictorError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Employee not found")]
    EmployeeNotFound,

    #[error("No employees found in this department")]
    DepartmentEmpty,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(message) => Self::BadRequest(message),
            StoreError::NotFound(_) => Self::EmployeeNotFound,
            StoreError::NoData { .. } => Self::DepartmentEmpty,
            StoreError::Storage { message } => Self::Storage(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({"error": message})),
            ApiError::EmployeeNotFound => (
                StatusCode::NOT_FOUND,
                json!({"error": "Employee not found"}),
            ),
            ApiError::DepartmentEmpty => (
                StatusCode::NOT_FOUND,
                json!({"message": "No employees found in this department"}),
            ),
            ApiError::Storage(message) => {
                tracing::error!(error = %message, "Storage failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal storage error"}),
                )
            }
            ApiError::Predictor(PredictorError::Unavailable) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"error": "Salary predictor is not configured"}),
            ),
            ApiError::Predictor(e) => {
                tracing::error!(error = %e, "Salary prediction failed");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({"error": "Salary prediction failed"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
