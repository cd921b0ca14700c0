//! PostgreSQL persistence for employee rows.
//!
//! Requires the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! employee-crud = { features = ["postgres"] }
//! ```

#[cfg(feature = "postgres")]
mod inner {
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use sqlx::{PgPool, Row};

    use crate::error::{Result, StoreError};
    use crate::model::{Employee, EmployeeUpdate, NewEmployee};
    use crate::store::EmployeeStore;

    const SELECT_COLUMNS: &str = "SELECT id, name, department, salary, hire_date FROM employees";

    /// PostgreSQL store for employee data.
    #[derive(Clone)]
    pub struct PgEmployeeStore {
        pool: PgPool,
    }

    impl PgEmployeeStore {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        /// Connect to `database_url` with a default pool.
        pub async fn connect(database_url: &str) -> Result<Self> {
            let pool = PgPool::connect(database_url).await?;
            Ok(Self::new(pool))
        }
    }

    fn row_to_employee(row: &sqlx::postgres::PgRow) -> std::result::Result<Employee, sqlx::Error> {
        Ok(Employee {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            department: row.try_get("department")?,
            salary: row.try_get("salary")?,
            hire_date: row.try_get::<NaiveDateTime, _>("hire_date")?,
        })
    }

    fn rows_to_employees(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<Employee>> {
        rows.iter()
            .map(|row| row_to_employee(row).map_err(StoreError::from))
            .collect()
    }

    fn limit_param(n: usize) -> i64 {
        i64::try_from(n).unwrap_or(i64::MAX)
    }

    #[async_trait]
    impl EmployeeStore for PgEmployeeStore {
        async fn ensure_schema(&self) -> Result<()> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS employees (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    department TEXT NOT NULL,
                    salary DOUBLE PRECISION NOT NULL,
                    hire_date TIMESTAMP NOT NULL
                )
                "#,
            )
            .execute(&self.pool)
            .await?;

            for statement in [
                "CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department)",
                "CREATE INDEX IF NOT EXISTS idx_employees_salary ON employees(salary)",
                "CREATE INDEX IF NOT EXISTS idx_employees_hire_date ON employees(hire_date)",
            ] {
                sqlx::query(statement).execute(&self.pool).await?;
            }

            tracing::debug!("Employee table migrated");
            Ok(())
        }

        async fn create(&self, employee: &NewEmployee) -> Result<i64> {
            employee.validate()?;

            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO employees (name, department, salary, hire_date)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(&employee.name)
            .bind(&employee.department)
            .bind(employee.salary)
            .bind(employee.hire_date_or_now())
            .fetch_one(&self.pool)
            .await?;

            Ok(id)
        }

        async fn get_by_id(&self, id: i64) -> Result<Employee> {
            let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound(id))?;

            Ok(row_to_employee(&row)?)
        }

        async fn update_by_id(&self, id: i64, update: &EmployeeUpdate) -> Result<Employee> {
            update.validate()?;

            let mut tx = self.pool.begin().await?;

            let row = sqlx::query(&format!("{} WHERE id = $1 FOR UPDATE", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::NotFound(id))?;

            let mut employee = row_to_employee(&row)?;
            update.apply_to(&mut employee);

            sqlx::query(
                r#"
                UPDATE employees
                SET name = $1, department = $2, salary = $3, hire_date = $4
                WHERE id = $5
                "#,
            )
            .bind(&employee.name)
            .bind(&employee.department)
            .bind(employee.salary)
            .bind(employee.hire_date)
            .bind(id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(employee)
        }

        async fn delete_by_id(&self, id: i64) -> Result<()> {
            let result = sqlx::query("DELETE FROM employees WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<Employee>> {
            let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_COLUMNS))
                .fetch_all(&self.pool)
                .await?;
            rows_to_employees(rows)
        }

        async fn distinct_departments(&self) -> Result<Vec<String>> {
            let departments: Vec<String> = sqlx::query_scalar(
                "SELECT DISTINCT department FROM employees ORDER BY department",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(departments)
        }

        async fn by_department(&self, department: &str) -> Result<Vec<Employee>> {
            let rows = sqlx::query(&format!(
                "{} WHERE department = $1 ORDER BY id",
                SELECT_COLUMNS
            ))
            .bind(department)
            .fetch_all(&self.pool)
            .await?;
            rows_to_employees(rows)
        }

        async fn average_salary(&self, department: &str) -> Result<f64> {
            let average: Option<f64> = sqlx::query_scalar(
                "SELECT AVG(salary) FROM employees WHERE department = $1",
            )
            .bind(department)
            .fetch_one(&self.pool)
            .await?;

            average.ok_or_else(|| StoreError::NoData {
                department: department.to_string(),
            })
        }

        async fn top_earners(&self, n: usize) -> Result<Vec<Employee>> {
            let rows = sqlx::query(&format!(
                "{} ORDER BY salary DESC, id ASC LIMIT $1",
                SELECT_COLUMNS
            ))
            .bind(limit_param(n))
            .fetch_all(&self.pool)
            .await?;
            rows_to_employees(rows)
        }

        async fn most_recent_hires(&self, n: usize) -> Result<Vec<Employee>> {
            let rows = sqlx::query(&format!(
                "{} ORDER BY hire_date DESC, id ASC LIMIT $1",
                SELECT_COLUMNS
            ))
            .bind(limit_param(n))
            .fetch_all(&self.pool)
            .await?;
            rows_to_employees(rows)
        }
    }
}

#[cfg(feature = "postgres")]
pub use inner::*;
