//! HTTP client for an external salary prediction service.
//!
//! The service is expected to accept `POST {base_url}/predict` with a
//! [`PredictionRequest`] body and answer `{"predicted_salary": <number>}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ensure_finite, PredictionRequest, PredictorError, SalaryPredictor};

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    predicted_salary: f64,
}

/// Remote salary predictor.
#[derive(Debug, Clone)]
pub struct RemotePredictor {
    endpoint: String,
    client: reqwest::Client,
}

impl RemotePredictor {
    /// Build a client for the service rooted at `base_url`.
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, PredictorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PredictorError::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/predict", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SalaryPredictor for RemotePredictor {
    async fn predict(&self, request: &PredictionRequest) -> Result<f64, PredictorError> {
        tracing::debug!(endpoint = %self.endpoint, "Requesting salary prediction");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| PredictorError::Upstream(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictorError::Upstream(format!(
                "Predictor responded with status {}",
                status
            )));
        }

        let body: PredictionResponse = response
            .json()
            .await
            .map_err(|e| PredictorError::Upstream(format!("Invalid response body: {}", e)))?;

        ensure_finite(body.predicted_salary)
    }
}
