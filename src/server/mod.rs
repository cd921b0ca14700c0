//! HTTP server for the employee record store.
//!
//! Translates requests into `EmployeeStore` calls and serializes results as
//! JSON. See [`routes`] for the endpoint list.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{app_router, AppState};
