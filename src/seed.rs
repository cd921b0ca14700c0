//! Synthetic employee data for local development.
//!
//! Invoked only by `employee-admin seed`; the server never seeds on its own.

use chrono::{Duration, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::model::{now_seconds, NewEmployee};
use crate::store::EmployeeStore;

/// Default number of rows inserted by `employee-admin seed`.
pub const DEFAULT_SEED_COUNT: usize = 1000;

/// Upper bound for generated salaries.
pub const MAX_SEED_SALARY: f64 = 1_000_000.0;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Donald", "Edsger", "Frances", "Grace",
    "Hedy", "John", "Katherine", "Ken", "Leslie", "Linus", "Margaret", "Niklaus", "Radia",
    "Shafi", "Tim",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Berners-Lee", "Dijkstra", "Hamilton", "Hopper", "Johnson", "Kay", "Knuth",
    "Lamport", "Liskov", "Lovelace", "McCarthy", "Perlman", "Ritchie", "Shannon", "Thompson",
    "Torvalds", "Turing", "Wirth", "Goldwasser",
];

const DEPARTMENTS: &[&str] = &[
    "Accountant",
    "Data scientist",
    "Designer",
    "Engineer",
    "Lawyer",
    "Marketing manager",
    "Nurse",
    "Product manager",
    "Sales representative",
    "Teacher",
];

/// Generate `count` random employees hired within a year before `now`.
pub fn synthetic_employees<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    now: NaiveDateTime,
) -> Vec<NewEmployee> {
    let year_seconds = Duration::days(365).num_seconds();

    (0..count)
        .map(|_| {
            let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ada");
            let last = LAST_NAMES.choose(rng).copied().unwrap_or("Lovelace");
            let department = DEPARTMENTS.choose(rng).copied().unwrap_or("Engineer");
            let salary = (rng.gen_range(0.0..=MAX_SEED_SALARY) * 100.0).round() / 100.0;
            let hire_date = now - Duration::seconds(rng.gen_range(0..=year_seconds));

            NewEmployee::new(format!("{} {}", first, last), department, salary, Some(hire_date))
        })
        .collect()
}

/// Insert `count` synthetic employees and return the number created.
pub async fn seed_store(store: &dyn EmployeeStore, count: usize) -> Result<usize> {
    let employees = synthetic_employees(&mut rand::thread_rng(), count, now_seconds());

    for employee in &employees {
        store.create(employee).await?;
    }

    tracing::info!(count = employees.len(), "Seeded synthetic employees");
    Ok(employees.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteEmployeeStore;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_synthetic_employees_are_valid() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let employees = synthetic_employees(&mut rng, 200, now);

        assert_eq!(employees.len(), 200);
        for employee in &employees {
            assert!(employee.validate().is_ok());
            assert!(employee.salary <= MAX_SEED_SALARY);
            let hire_date = employee.hire_date.unwrap();
            assert!(hire_date <= now);
            assert!(hire_date >= now - Duration::days(365));
        }
    }

    #[tokio::test]
    async fn test_seed_store_inserts_rows() {
        let store = SqliteEmployeeStore::open_in_memory().unwrap();
        store.ensure_schema().await.unwrap();

        let created = seed_store(&store, 25).await.unwrap();
        assert_eq!(created, 25);
        assert_eq!(store.list_all().await.unwrap().len(), 25);
    }
}
