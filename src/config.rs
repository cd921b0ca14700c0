//! Process configuration.
//!
//! Command-line flags cover host, port and the debug toggle. Everything else
//! (storage backend, predictor) comes from the environment:
//!
//! - `EMPLOYEE_STORE` — `sqlite` (default) or `postgres`
//! - `EMPLOYEE_DB` — SQLite file path (default: `employees.db`)
//! - `DATABASE_URL` — PostgreSQL connection string (required for `postgres`)
//! - `PREDICTOR_URL` — base URL of an external salary predictor
//! - `PREDICTOR_TIMEOUT_MS` — predictor request timeout (default: 5000)
//! - `PREDICTOR_MODEL` — path to a baseline model written by `employee-admin train`

use std::collections::HashMap;
use std::net::SocketAddr;

use clap::Parser;
use thiserror::Error;

use crate::predictor::remote::DEFAULT_TIMEOUT_MS;

pub const DEFAULT_DB_PATH: &str = "employees.db";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {0}")]
    Missing(String),
}

/// Command-line flags for the `server` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "server")]
#[command(about = "Employee record HTTP service")]
pub struct ServerArgs {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    #[arg(long, env = "DEBUG", help = "Enable debug logging")]
    pub debug: bool,
}

impl ServerArgs {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                key: "host".to_string(),
                value: self.host.clone(),
                reason: e.to_string(),
            })
    }
}

/// Which record store backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Sqlite { path: String },
    Postgres { database_url: String },
}

/// Which salary predictor to wire into the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictorConfig {
    Remote { base_url: String, timeout_ms: u64 },
    Model { path: String },
    None,
}

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub predictor: PredictorConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build the configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();

        let store = match vars.get("EMPLOYEE_STORE").map(|s| s.to_lowercase()).as_deref() {
            None | Some("sqlite") => StoreConfig::Sqlite {
                path: vars
                    .get("EMPLOYEE_DB")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            },
            Some("postgres") => StoreConfig::Postgres {
                database_url: vars
                    .get("DATABASE_URL")
                    .cloned()
                    .ok_or_else(|| ConfigError::Missing("DATABASE_URL".to_string()))?,
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "EMPLOYEE_STORE".to_string(),
                    value: other.to_string(),
                    reason: "expected 'sqlite' or 'postgres'".to_string(),
                })
            }
        };

        let timeout_ms = match vars.get("PREDICTOR_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|ms| *ms > 0).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "PREDICTOR_TIMEOUT_MS".to_string(),
                    value: raw.clone(),
                    reason: "must be a positive integer".to_string(),
                }
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let predictor = if let Some(base_url) = vars.get("PREDICTOR_URL") {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    key: "PREDICTOR_URL".to_string(),
                    value: base_url.clone(),
                    reason: "must be an http(s) URL".to_string(),
                });
            }
            PredictorConfig::Remote {
                base_url: base_url.clone(),
                timeout_ms,
            }
        } else if let Some(path) = vars.get("PREDICTOR_MODEL") {
            PredictorConfig::Model { path: path.clone() }
        } else {
            PredictorConfig::None
        };

        Ok(Self { store, predictor })
    }
}
