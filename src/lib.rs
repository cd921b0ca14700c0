//! # employee-crud
//!
//! A small record-store HTTP service for employee records.
//!
//! The [`store`] module owns persistence behind the `EmployeeStore` trait,
//! [`server`] exposes it over HTTP with axum, and [`predictor`] holds the
//! salary prediction collaborators behind `/predict_salary`. Seeding and
//! model fitting live in [`seed`] and are run by the `employee-admin`
//! binary, never by the server itself.

pub mod config;
pub mod error;
pub mod model;
pub mod predictor;
pub mod seed;
pub mod server;
pub mod store;

pub use error::StoreError;
pub use model::{Employee, EmployeeUpdate, NewEmployee};
pub use server::{app_router, AppState};
pub use store::{EmployeeStore, SqliteEmployeeStore};

/// Crate version reported by `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
