//! Salary prediction collaborators.
//!
//! The HTTP layer only sees the [`SalaryPredictor`] trait. Implementations:
//!
//! - [`remote::RemotePredictor`] — calls an external prediction service.
//! - [`baseline::BaselineModel`] — a fitted model loaded from a JSON file.
//! - [`UnconfiguredPredictor`] — always reports that no predictor is available.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PredictorConfig;
use crate::model::HIRE_DATE_STRICT_FORMAT;

pub mod baseline;
pub mod remote;

pub use baseline::{BaselineModel, ModelError};
pub use remote::RemotePredictor;

/// Errors from a salary predictor.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// No predictor has been configured for this process.
    #[error("Salary predictor is not configured")]
    Unavailable,

    /// The external predictor failed or returned something unusable.
    #[error("Salary predictor failed: {0}")]
    Upstream(String),

    /// The predictor produced a value that is not a finite number.
    #[error("Salary predictor returned an invalid value: {0}")]
    InvalidOutput(f64),

    /// A baseline model file could not be loaded.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Input for a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub department: String,
    #[serde(with = "strict_date")]
    pub hire_date: NaiveDateTime,
    pub job_title: String,
}

/// Scores a prospective hire.
#[async_trait]
pub trait SalaryPredictor: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<f64, PredictorError>;
}

/// Placeholder used when neither a remote service nor a model file is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredPredictor;

#[async_trait]
impl SalaryPredictor for UnconfiguredPredictor {
    async fn predict(&self, _request: &PredictionRequest) -> Result<f64, PredictorError> {
        Err(PredictorError::Unavailable)
    }
}

/// Build the predictor selected by configuration.
pub fn build_predictor(config: &PredictorConfig) -> Result<Arc<dyn SalaryPredictor>, PredictorError> {
    match config {
        PredictorConfig::Remote {
            base_url,
            timeout_ms,
        } => {
            let predictor = RemotePredictor::new(base_url, *timeout_ms)?;
            tracing::info!(endpoint = %predictor.endpoint(), "Using remote salary predictor");
            Ok(Arc::new(predictor))
        }
        PredictorConfig::Model { path } => {
            let model = BaselineModel::load(path)?;
            tracing::info!(
                path = %path,
                samples = model.sample_size,
                "Loaded baseline salary model"
            );
            Ok(Arc::new(model))
        }
        PredictorConfig::None => {
            tracing::warn!("No salary predictor configured; /predict_salary will return 503");
            Ok(Arc::new(UnconfiguredPredictor))
        }
    }
}

/// Reject NaN and infinities coming out of any predictor.
pub fn ensure_finite(value: f64) -> Result<f64, PredictorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictorError::InvalidOutput(value))
    }
}

mod strict_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::HIRE_DATE_STRICT_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(HIRE_DATE_STRICT_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, HIRE_DATE_STRICT_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_unconfigured_predictor_is_unavailable() {
        let request = PredictionRequest {
            department: "Eng".to_string(),
            hire_date: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
            job_title: "Engineer".to_string(),
        };
        let err = UnconfiguredPredictor.predict(&request).await.unwrap_err();
        assert!(matches!(err, PredictorError::Unavailable));
    }

    #[test]
    fn test_request_uses_strict_date_format() {
        let request = PredictionRequest {
            department: "Eng".to_string(),
            hire_date: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
            job_title: "Engineer".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["hire_date"], "2024-01-02 03:04:05");
    }

    #[test]
    fn test_build_predictor_from_missing_model_fails() {
        let config = PredictorConfig::Model {
            path: "/nonexistent/model.json".to_string(),
        };
        assert!(matches!(
            build_predictor(&config),
            Err(PredictorError::Model(ModelError::Io(_)))
        ));
        assert!(build_predictor(&PredictorConfig::None).is_ok());
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.5).unwrap(), 1.5);
        assert!(ensure_finite(f64::NAN).is_err());
        assert!(ensure_finite(f64::INFINITY).is_err());
    }
}
