//! Baseline salary model fitted from stored employees.
//!
//! The model is a per-group mean salary plus a single least-squares slope on
//! tenure (days between hire date and the fitting reference time). Groups
//! are department names; a `job_title` that matches a group is used when the
//! department is unknown, since seeded departments are job titles.
//!
//! Fitting only happens through an explicit call (`employee-admin train`);
//! the server merely loads the resulting JSON file.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ensure_finite, PredictionRequest, PredictorError, SalaryPredictor};
use crate::model::Employee;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Cannot fit a model on zero employees")]
    NoTrainingData,

    #[error("Model file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fitted baseline model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineModel {
    /// Tenure is measured relative to this instant.
    pub reference_time: NaiveDateTime,
    pub global_mean: f64,
    pub group_means: BTreeMap<String, f64>,
    /// Salary change per day of tenure.
    pub tenure_slope: f64,
    pub mean_tenure_days: f64,
    pub sample_size: usize,
}

fn tenure_days(reference: NaiveDateTime, hire_date: NaiveDateTime) -> f64 {
    (reference - hire_date).num_seconds() as f64 / SECONDS_PER_DAY
}

impl BaselineModel {
    pub fn fit(employees: &[Employee], reference_time: NaiveDateTime) -> Result<Self, ModelError> {
        if employees.is_empty() {
            return Err(ModelError::NoTrainingData);
        }
        let n = employees.len() as f64;

        let global_mean = employees.iter().map(|e| e.salary).sum::<f64>() / n;

        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for employee in employees {
            let entry = sums.entry(employee.department.clone()).or_insert((0.0, 0));
            entry.0 += employee.salary;
            entry.1 += 1;
        }
        let group_means: BTreeMap<String, f64> = sums
            .into_iter()
            .map(|(group, (sum, count))| (group, sum / count as f64))
            .collect();

        let tenures: Vec<f64> = employees
            .iter()
            .map(|e| tenure_days(reference_time, e.hire_date))
            .collect();
        let mean_tenure_days = tenures.iter().sum::<f64>() / n;

        // Slope of the residual (salary minus group mean) against centered tenure.
        let mut covariance = 0.0;
        let mut variance = 0.0;
        for (employee, tenure) in employees.iter().zip(&tenures) {
            let centered = tenure - mean_tenure_days;
            let residual = employee.salary - group_means[&employee.department];
            covariance += centered * residual;
            variance += centered * centered;
        }
        let tenure_slope = if variance > f64::EPSILON {
            covariance / variance
        } else {
            0.0
        };

        Ok(Self {
            reference_time,
            global_mean,
            group_means,
            tenure_slope,
            mean_tenure_days,
            sample_size: employees.len(),
        })
    }

    /// Score a request without going through the async trait.
    pub fn score(&self, department: &str, job_title: &str, hire_date: NaiveDateTime) -> f64 {
        let base = self
            .group_means
            .get(department)
            .or_else(|| self.group_means.get(job_title))
            .copied()
            .unwrap_or(self.global_mean);

        let tenure = tenure_days(self.reference_time, hire_date);
        let score = base + self.tenure_slope * (tenure - self.mean_tenure_days);
        // Non-finite scores are returned unclamped.
        if score.is_finite() {
            score.max(0.0)
        } else {
            score
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl SalaryPredictor for BaselineModel {
    async fn predict(&self, request: &PredictionRequest) -> Result<f64, PredictorError> {
        ensure_finite(self.score(&request.department, &request.job_title, request.hire_date))
    }
}
