//! employee-admin: explicit initialization steps for the employee service.
//!
//! - `seed`  — insert synthetic employees
//! - `train` — fit the baseline salary model from stored employees
//!
//! Uses the same `EMPLOYEE_STORE` / `EMPLOYEE_DB` / `DATABASE_URL`
//! environment as the server.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use employee_crud::config::AppConfig;
use employee_crud::model::now_seconds;
use employee_crud::predictor::BaselineModel;
use employee_crud::seed::{seed_store, DEFAULT_SEED_COUNT};
use employee_crud::store::open_store;

#[derive(Debug, Parser)]
#[command(name = "employee-admin")]
#[command(about = "Seed data and fit the salary model for employee-crud")]
struct Cli {
    #[arg(long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Insert synthetic employees.
    Seed {
        #[arg(long, default_value_t = DEFAULT_SEED_COUNT)]
        count: usize,
    },
    /// Fit the baseline salary model and write it as JSON.
    Train {
        #[arg(long, default_value = "salary_model.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "employee_crud=debug,info"
    } else {
        "employee_crud=info,info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let store = open_store(&config.store)
        .await
        .context("Failed to open employee store")?;
    store
        .ensure_schema()
        .await
        .context("Failed to create employee table")?;

    match cli.command {
        Command::Seed { count } => {
            let created = seed_store(store.as_ref(), count)
                .await
                .context("Seeding failed")?;
            println!("Inserted {} employees", created);
        }
        Command::Train { out } => {
            let employees = store.list_all().await.context("Failed to read employees")?;
            let model = BaselineModel::fit(&employees, now_seconds())
                .context("Failed to fit salary model")?;
            model
                .save(&out)
                .with_context(|| format!("Failed to write {}", out.display()))?;

            tracing::info!(
                samples = model.sample_size,
                groups = model.group_means.len(),
                "Fitted baseline salary model"
            );
            println!("Model written to {}", out.display());
        }
    }

    Ok(())
}
