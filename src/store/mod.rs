//! Record store for employee rows.
//!
//! Provides the `EmployeeStore` trait and its backends:
//!
//! - [`sqlite::SqliteEmployeeStore`] — default, file or in-memory SQLite.
//! - [`postgres::PgEmployeeStore`] — PostgreSQL, behind the `postgres` feature.
//!
//! Every operation is a single statement or a single transaction, so a
//! dropped request never leaves a partial write behind.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::model::{Employee, EmployeeUpdate, NewEmployee};

pub mod postgres;
pub mod sqlite;

pub use sqlite::SqliteEmployeeStore;

/// Row limit for the "top N" queries.
pub const DEFAULT_TOP_N: usize = 10;

/// Durable storage and retrieval of employee records against one table.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Create the table and its indexes if they do not exist yet.
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert a new row and return its assigned id.
    ///
    /// Fails with `StoreError::Validation` before touching storage when the
    /// input is malformed.
    async fn create(&self, employee: &NewEmployee) -> Result<i64>;

    /// Point lookup by primary key.
    async fn get_by_id(&self, id: i64) -> Result<Employee>;

    /// Apply the fields present in `update` atomically and return the result.
    async fn update_by_id(&self, id: i64, update: &EmployeeUpdate) -> Result<Employee>;

    /// Remove a row permanently.
    async fn delete_by_id(&self, id: i64) -> Result<()>;

    /// Every row, ordered by id.
    async fn list_all(&self) -> Result<Vec<Employee>>;

    /// Distinct department names, alphabetically.
    async fn distinct_departments(&self) -> Result<Vec<String>>;

    /// Rows in `department`, ordered by id. Empty when none match.
    async fn by_department(&self, department: &str) -> Result<Vec<Employee>>;

    /// Mean salary over `department`; `StoreError::NoData` on zero rows.
    async fn average_salary(&self, department: &str) -> Result<f64>;

    /// Highest salaries first, ties by insertion order, at most `n` rows.
    async fn top_earners(&self, n: usize) -> Result<Vec<Employee>>;

    /// Latest hire dates first, ties by insertion order, at most `n` rows.
    async fn most_recent_hires(&self, n: usize) -> Result<Vec<Employee>>;
}

/// Open the configured backend. The schema is left to `ensure_schema`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn EmployeeStore>> {
    match config {
        StoreConfig::Sqlite { path } => {
            tracing::info!(path = %path, "Using SQLite employee store");
            Ok(Arc::new(SqliteEmployeeStore::open(path)?))
        }
        #[cfg(feature = "postgres")]
        StoreConfig::Postgres { database_url } => {
            tracing::info!("Connecting to PostgreSQL...");
            Ok(Arc::new(postgres::PgEmployeeStore::connect(database_url).await?))
        }
        #[cfg(not(feature = "postgres"))]
        StoreConfig::Postgres { .. } => Err(crate::error::StoreError::storage(
            "EMPLOYEE_STORE=postgres requires building with the `postgres` feature",
        )),
    }
}
