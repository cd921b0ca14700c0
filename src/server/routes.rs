//! Axum route handlers for the employee service.
//!
//! # Routes
//!
//! - `GET    /health`                    — liveness probe
//! - `GET    /employees`                 — all employees
//! - `POST   /employees`                 — create, returns `{"id": n}` with 201
//! - `GET    /employees/:id`             — one employee
//! - `PUT    /employees/:id`             — partial update
//! - `DELETE /employees/:id`             — hard delete, 204
//! - `GET    /departments`               — distinct department names
//! - `GET    /departments/:name`         — `{"employees": [...]}`
//! - `GET    /average_salary/:department` — `{"average_salary": x}`
//! - `GET    /top_earners`               — ten highest salaries
//! - `GET    /most_recent_hires`         — ten latest hires
//! - `POST   /predict_salary`            — `{"predicted_salary": x}`

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use crate::model::{parse_strict_hire_date, Employee, EmployeeUpdate, NewEmployee};
use crate::predictor::{PredictionRequest, SalaryPredictor};
use crate::store::{EmployeeStore, DEFAULT_TOP_N};

type ApiResult<T> = Result<T, ApiError>;

/// Shared application state for the HTTP server.
///
/// Holds only the injected collaborators; handlers keep nothing between
/// requests.
#[derive(Clone)]
pub struct AppState {
    /// Record store backing every employee route.
    pub store: Arc<dyn EmployeeStore>,
    /// Scoring function behind `/predict_salary`.
    pub predictor: Arc<dyn SalaryPredictor>,
}

impl AppState {
    pub fn new(store: Arc<dyn EmployeeStore>, predictor: Arc<dyn SalaryPredictor>) -> Self {
        Self { store, predictor }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/departments", get(list_departments))
        .route("/departments/:name", get(department_employees))
        .route("/average_salary/:department", get(average_salary))
        .route("/top_earners", get(top_earners))
        .route("/most_recent_hires", get(most_recent_hires))
        .route("/predict_salary", post(predict_salary))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Salaries and predictions are reported to the cent.
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Non-integer ids can never match a row, so they are reported as absent.
fn employee_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id).map_err(|_| ApiError::EmployeeNotFound)
}

/// GET /health: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "employee-crud",
        "version": crate::VERSION,
    }))
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"})))
}

/// GET /employees
async fn list_employees(State(state): State<AppState>) -> ApiResult<Json<Vec<Employee>>> {
    Ok(Json(state.store.list_all().await?))
}

/// GET /employees/:id
async fn get_employee(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Employee>> {
    let id = employee_id(id)?;
    Ok(Json(state.store.get_by_id(id).await?))
}

/// POST /employees
///
/// Requires `name`, `department` and `salary`; `hire_date` is optional.
async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    let employee = NewEmployee::from_json(&body)?;

    let id = state.store.create(&employee).await?;
    tracing::info!(id, department = %employee.department, "Created employee");

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// PUT /employees/:id
///
/// An unknown id wins over a bad body: 404 is reported before 400.
async fn update_employee(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Employee>> {
    let id = employee_id(id)?;

    let update = payload
        .map_err(ApiError::from)
        .and_then(|Json(body)| EmployeeUpdate::from_json(&body).map_err(ApiError::from));

    let update = match update {
        Ok(update) => update,
        Err(e) => {
            state.store.get_by_id(id).await?;
            return Err(e);
        }
    };

    let employee = state.store.update_by_id(id, &update).await?;
    tracing::info!(id, "Updated employee");
    Ok(Json(employee))
}

/// DELETE /employees/:id
async fn delete_employee(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = employee_id(id)?;
    state.store.delete_by_id(id).await?;
    tracing::info!(id, "Deleted employee");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /departments
async fn list_departments(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.store.distinct_departments().await?))
}

/// GET /departments/:name
async fn department_employees(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let employees = state.store.by_department(&name).await?;
    if employees.is_empty() {
        return Err(ApiError::DepartmentEmpty);
    }
    Ok(Json(json!({ "employees": employees })))
}

/// GET /average_salary/:department
async fn average_salary(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> ApiResult<Json<Value>> {
    let average = state.store.average_salary(&department).await?;
    Ok(Json(json!({ "average_salary": round_cents(average) })))
}

/// GET /top_earners
async fn top_earners(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let employees = state.store.top_earners(DEFAULT_TOP_N).await?;
    Ok(Json(json!({ "employees": employees })))
}

/// GET /most_recent_hires
async fn most_recent_hires(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let employees = state.store.most_recent_hires(DEFAULT_TOP_N).await?;
    Ok(Json(json!({ "employees": employees })))
}

#[derive(Debug, Deserialize)]
struct PredictBody {
    department: Option<String>,
    hire_date: Option<String>,
    job_title: Option<String>,
}

/// POST /predict_salary
///
/// Request body: `{ "department": "...", "hire_date": "YYYY-MM-DD HH:MM:SS", "job_title": "..." }`
async fn predict_salary(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let body: PredictBody = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed prediction request: {}", e)))?;

    let (Some(department), Some(hire_date), Some(job_title)) =
        (body.department, body.hire_date, body.job_title)
    else {
        return Err(ApiError::BadRequest("Missing data".to_string()));
    };
    let hire_date = parse_strict_hire_date(&hire_date)?;

    let request = PredictionRequest {
        department,
        hire_date,
        job_title,
    };
    let predicted = state.predictor.predict(&request).await?;

    Ok(Json(json!({ "predicted_salary": round_cents(predicted) })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
