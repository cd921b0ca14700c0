//! employee-crud HTTP server binary.
//!
//! Opens the configured record store, makes sure the table exists, wires in
//! the salary predictor and serves the JSON API until Ctrl-C.
//!
//! # Flags
//!
//! - `--host` / `HOST` — bind address (default: 127.0.0.1)
//! - `--port` / `PORT` — HTTP port (default: 5000)
//! - `--debug` / `DEBUG` — debug-level logging
//!
//! Storage and predictor settings are read from the environment; see
//! `employee_crud::config`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server -- --port 8080
//! # or with postgres:
//! EMPLOYEE_STORE=postgres DATABASE_URL=postgres://... cargo run --bin server --features postgres
//! ```

use anyhow::Context;
use clap::Parser;

use employee_crud::config::{AppConfig, ServerArgs};
use employee_crud::predictor::build_predictor;
use employee_crud::server::{app_router, AppState};
use employee_crud::store::open_store;

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "debug,employee_crud=debug,tower_http=debug"
    } else {
        "info,employee_crud=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.debug);

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let bind_addr = args.socket_addr().context("Invalid bind address")?;

    let store = open_store(&config.store)
        .await
        .context("Failed to open employee store")?;
    store
        .ensure_schema()
        .await
        .context("Failed to create employee table")?;

    let predictor = build_predictor(&config.predictor).context("Failed to set up salary predictor")?;

    let app = app_router(AppState::new(store, predictor));

    tracing::info!("employee-crud server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health (liveness probe)");
    tracing::info!("  GET    /employees, POST /employees");
    tracing::info!("  GET    /employees/:id, PUT, DELETE");
    tracing::info!("  GET    /departments, /departments/:name");
    tracing::info!("  GET    /average_salary/:department");
    tracing::info!("  GET    /top_earners, /most_recent_hires");
    tracing::info!("  POST   /predict_salary");

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    Ok(())
}
