//! SQLite-backed employee store.
//!
//! rusqlite is synchronous, so every call takes the shared connection on a
//! blocking task. `hire_date` is stored as fixed-width text
//! (`YYYY-MM-DD HH:MM:SS`), which makes lexical order chronological.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::EmployeeStore;
use crate::error::{Result, StoreError};
use crate::model::{Employee, EmployeeUpdate, NewEmployee};

const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = "SELECT id, name, department, salary, hire_date FROM employees";

/// SQLite implementation of [`EmployeeStore`].
#[derive(Clone)]
pub struct SqliteEmployeeStore {
    /// Path to the database file, or `:memory:`.
    pub db_path: String,
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteEmployeeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEmployeeStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl SqliteEmployeeStore {
    /// Open (or create) the database file at `path`.
    ///
    /// The schema is not created here; call `ensure_schema` explicitly.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::storage(format!(
                        "Failed to create database directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened SQLite employee store");

        Ok(Self {
            db_path: path.to_string_lossy().to_string(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            db_path: ":memory:".to_string(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|e| {
                StoreError::storage(format!("Failed to acquire database lock: {}", e))
            })?;
            f(&mut guard)
        })
        .await?
    }
}

fn format_hire_date(value: &NaiveDateTime) -> String {
    value.format(STORAGE_FORMAT).to_string()
}

fn row_to_employee(row: &Row<'_>) -> rusqlite::Result<Employee> {
    let raw_hire_date: String = row.get(4)?;
    let hire_date = NaiveDateTime::parse_from_str(&raw_hire_date, STORAGE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        salary: row.get(3)?,
        hire_date,
    })
}

fn query_employees(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Employee>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, row_to_employee)?;

    let mut employees = Vec::new();
    for row in rows {
        employees.push(row?);
    }
    Ok(employees)
}

fn limit_param(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl EmployeeStore for SqliteEmployeeStore {
    async fn ensure_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS employees (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    department TEXT NOT NULL,
                    salary REAL NOT NULL,
                    hire_date TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_employees_department
                    ON employees(department);
                CREATE INDEX IF NOT EXISTS idx_employees_salary
                    ON employees(salary);
                CREATE INDEX IF NOT EXISTS idx_employees_hire_date
                    ON employees(hire_date);",
            )?;
            Ok(())
        })
        .await
    }

    async fn create(&self, employee: &NewEmployee) -> Result<i64> {
        employee.validate()?;

        let name = employee.name.clone();
        let department = employee.department.clone();
        let salary = employee.salary;
        let hire_date = format_hire_date(&employee.hire_date_or_now());

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO employees (name, department, salary, hire_date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, department, salary, hire_date],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Employee> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                row_to_employee,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
        })
        .await
    }

    async fn update_by_id(&self, id: i64, update: &EmployeeUpdate) -> Result<Employee> {
        update.validate()?;
        let update = update.clone();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let mut employee = tx
                .query_row(
                    &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                    params![id],
                    row_to_employee,
                )
                .optional()?
                .ok_or(StoreError::NotFound(id))?;

            update.apply_to(&mut employee);

            tx.execute(
                "UPDATE employees
                 SET name = ?1, department = ?2, salary = ?3, hire_date = ?4
                 WHERE id = ?5",
                params![
                    employee.name,
                    employee.department,
                    employee.salary,
                    format_hire_date(&employee.hire_date),
                    id
                ],
            )?;
            tx.commit()?;

            Ok(employee)
        })
        .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            let deleted = conn.execute("DELETE FROM employees WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Employee>> {
        self.with_conn(|conn| {
            query_employees(conn, &format!("{} ORDER BY id", SELECT_COLUMNS), [])
        })
        .await
    }

    async fn distinct_departments(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT department FROM employees ORDER BY department")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut departments = Vec::new();
            for row in rows {
                departments.push(row?);
            }
            Ok(departments)
        })
        .await
    }

    async fn by_department(&self, department: &str) -> Result<Vec<Employee>> {
        let department = department.to_string();
        self.with_conn(move |conn| {
            query_employees(
                conn,
                &format!("{} WHERE department = ?1 ORDER BY id", SELECT_COLUMNS),
                params![department],
            )
        })
        .await
    }

    async fn average_salary(&self, department: &str) -> Result<f64> {
        let department = department.to_string();
        self.with_conn(move |conn| {
            let (average, count): (Option<f64>, i64) = conn.query_row(
                "SELECT AVG(salary), COUNT(*) FROM employees WHERE department = ?1",
                params![department],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            match average {
                Some(average) if count > 0 => Ok(average),
                _ => Err(StoreError::NoData { department }),
            }
        })
        .await
    }

    async fn top_earners(&self, n: usize) -> Result<Vec<Employee>> {
        self.with_conn(move |conn| {
            query_employees(
                conn,
                &format!("{} ORDER BY salary DESC, id ASC LIMIT ?1", SELECT_COLUMNS),
                params![limit_param(n)],
            )
        })
        .await
    }

    async fn most_recent_hires(&self, n: usize) -> Result<Vec<Employee>> {
        self.with_conn(move |conn| {
            query_employees(
                conn,
                &format!("{} ORDER BY hire_date DESC, id ASC LIMIT ?1", SELECT_COLUMNS),
                params![limit_param(n)],
            )
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DEFAULT_TOP_N;
    use chrono::NaiveDate;

    async fn store() -> SqliteEmployeeStore {
        let store = SqliteEmployeeStore::open_in_memory().unwrap();
        store.ensure_schema().await.unwrap();
        store
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let store = store().await;
        store.ensure_schema().await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = store().await;
        let hire_date = day(2020, 2, 2);
        let id = store
            .create(&NewEmployee::new("Ada", "Eng", 150000.0, Some(hire_date)))
            .await
            .unwrap();

        let employee = store.get_by_id(id).await.unwrap();
        assert_eq!(employee.id, id);
        assert_eq!(employee.name, "Ada");
        assert_eq!(employee.department, "Eng");
        assert_eq!(employee.salary, 150000.0);
        assert_eq!(employee.hire_date, hire_date);
    }

    #[tokio::test]
    async fn test_create_defaults_hire_date_to_now() {
        let store = store().await;
        let before = crate::model::now_seconds();
        let id = store
            .create(&NewEmployee::new("Ada", "Eng", 1.0, None))
            .await
            .unwrap();
        let after = crate::model::now_seconds();

        let employee = store.get_by_id(id).await.unwrap();
        assert!(employee.hire_date >= before && employee.hire_date <= after);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let store = store().await;
        let err = store
            .create(&NewEmployee::new("", "Eng", 1.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = store
            .create(&NewEmployee::new("Ada", "Eng", -5.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = store().await;
        assert!(matches!(
            store.get_by_id(42).await.unwrap_err(),
            StoreError::NotFound(42)
        ));
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let store = store().await;
        let hire_date = day(2019, 7, 1);
        let id = store
            .create(&NewEmployee::new("Grace", "Ops", 90000.0, Some(hire_date)))
            .await
            .unwrap();

        let update = EmployeeUpdate {
            salary: Some(95000.0),
            ..Default::default()
        };
        let updated = store.update_by_id(id, &update).await.unwrap();
        assert_eq!(updated.salary, 95000.0);

        let fetched = store.get_by_id(id).await.unwrap();
        assert_eq!(fetched, updated);
        assert_eq!(fetched.name, "Grace");
        assert_eq!(fetched.department, "Ops");
        assert_eq!(fetched.hire_date, hire_date);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_partial_updates_keep_both_fields() {
        let store = store().await;
        let id = store
            .create(&NewEmployee::new("N0", "Eng", 0.0, Some(day(2020, 1, 1))))
            .await
            .unwrap();

        let names = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 1..50 {
                    let update = EmployeeUpdate {
                        name: Some(format!("N{}", i)),
                        ..Default::default()
                    };
                    store.update_by_id(id, &update).await.unwrap();
                }
            })
        };
        let salaries = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 1..50 {
                    let update = EmployeeUpdate {
                        salary: Some(f64::from(i)),
                        ..Default::default()
                    };
                    store.update_by_id(id, &update).await.unwrap();
                }
            })
        };
        names.await.unwrap();
        salaries.await.unwrap();

        let employee = store.get_by_id(id).await.unwrap();
        assert_eq!(employee.name, "N49");
        assert_eq!(employee.salary, 49.0);
        assert_eq!(employee.department, "Eng");
        assert_eq!(employee.hire_date, day(2020, 1, 1));
    }

    #[tokio::test]
    async fn test_update_missing_and_empty() {
        let store = store().await;
        let update = EmployeeUpdate {
            name: Some("Nobody".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_by_id(5, &update).await.unwrap_err(),
            StoreError::NotFound(5)
        ));

        let id = store
            .create(&NewEmployee::new("Ada", "Eng", 1.0, None))
            .await
            .unwrap();
        assert!(matches!(
            store
                .update_by_id(id, &EmployeeUpdate::default())
                .await
                .unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_is_permanent() {
        let store = store().await;
        let id = store
            .create(&NewEmployee::new("Ada", "Eng", 1.0, None))
            .await
            .unwrap();

        store.delete_by_id(id).await.unwrap();
        assert!(matches!(
            store.get_by_id(id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            store.delete_by_id(id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_department_queries() {
        let store = store().await;
        for (name, department, salary) in [
            ("Ada", "Eng", 100.0),
            ("Grace", "Eng", 200.0),
            ("Linus", "Ops", 50.0),
        ] {
            store
                .create(&NewEmployee::new(name, department, salary, None))
                .await
                .unwrap();
        }

        assert_eq!(
            store.distinct_departments().await.unwrap(),
            vec!["Eng".to_string(), "Ops".to_string()]
        );

        let eng = store.by_department("Eng").await.unwrap();
        assert_eq!(eng.len(), 2);
        assert!(eng.iter().all(|e| e.department == "Eng"));
        assert!(store.by_department("Sales").await.unwrap().is_empty());

        assert_eq!(store.average_salary("Eng").await.unwrap(), 150.0);
        assert!(matches!(
            store.average_salary("Sales").await.unwrap_err(),
            StoreError::NoData { .. }
        ));
    }

    #[tokio::test]
    async fn test_average_of_zero_salaries_is_zero_not_no_data() {
        let store = store().await;
        store
            .create(&NewEmployee::new("Intern", "Lab", 0.0, None))
            .await
            .unwrap();
        assert_eq!(store.average_salary("Lab").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_top_earners_limit_and_order() {
        let store = store().await;
        for i in 0..15 {
            let salary = f64::from((i * 7) % 11) * 1000.0;
            store
                .create(&NewEmployee::new(format!("E{}", i), "Eng", salary, None))
                .await
                .unwrap();
        }

        let top = store.top_earners(DEFAULT_TOP_N).await.unwrap();
        assert_eq!(top.len(), DEFAULT_TOP_N);
        for pair in top.windows(2) {
            assert!(pair[0].salary >= pair[1].salary);
            if pair[0].salary == pair[1].salary {
                assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[tokio::test]
    async fn test_most_recent_hires_order() {
        let store = store().await;
        let dates = [day(2020, 1, 1), day(2023, 6, 1), day(2021, 3, 1), day(2023, 6, 1)];
        for (i, date) in dates.iter().enumerate() {
            store
                .create(&NewEmployee::new(format!("E{}", i), "Eng", 1.0, Some(*date)))
                .await
                .unwrap();
        }

        let recent = store.most_recent_hires(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].hire_date, day(2023, 6, 1));
        assert_eq!(recent[1].hire_date, day(2023, 6, 1));
        assert!(recent[0].id < recent[1].id);
        assert_eq!(recent[2].hire_date, day(2021, 3, 1));
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("employees.db");

        let id = {
            let store = SqliteEmployeeStore::open(&path).unwrap();
            store.ensure_schema().await.unwrap();
            store
                .create(&NewEmployee::new("Ada", "Eng", 10.0, None))
                .await
                .unwrap()
        };

        let reopened = SqliteEmployeeStore::open(&path).unwrap();
        reopened.ensure_schema().await.unwrap();
        assert_eq!(reopened.get_by_id(id).await.unwrap().name, "Ada");
    }
}
