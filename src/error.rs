//! Error types for the record store.

use thiserror::Error;

/// Errors raised by `EmployeeStore` implementations and input validation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed client input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No employee with the given id.
    #[error("Employee {0} not found")]
    NotFound(i64),

    /// An aggregate ran over zero matching rows.
    #[error("No employees found in department '{department}'")]
    NoData { department: String },

    /// Backend I/O, constraint or connection failure.
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl StoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::storage(e.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::storage(format!("Storage task failed: {}", e))
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
