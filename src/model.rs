//! Employee record types and request-body validation.
//!
//! `Employee` is the persisted shape. `NewEmployee` and `EmployeeUpdate`
//! are the validated inputs for create and partial update; both are built
//! from raw JSON bodies so that missing or malformed fields are reported
//! before the store is touched.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// Format used when serializing `hire_date` in responses.
pub const HIRE_DATE_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Strict format required by the salary prediction endpoint.
pub const HIRE_DATE_STRICT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A persisted employee record.
///
/// Serialization always emits exactly these five fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub salary: f64,
    #[serde(with = "hire_date_format")]
    pub hire_date: NaiveDateTime,
}

/// Validated input for creating an employee.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub name: String,
    pub department: String,
    pub salary: f64,
    pub hire_date: Option<NaiveDateTime>,
}

/// Validated partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub department: Option<String>,
    pub salary: Option<f64>,
    pub hire_date: Option<NaiveDateTime>,
}

/// Raw shape shared by create and update bodies. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct EmployeeBody {
    name: Option<String>,
    department: Option<String>,
    salary: Option<f64>,
    hire_date: Option<String>,
}

impl EmployeeBody {
    fn from_value(body: &Value) -> Result<Self, StoreError> {
        if !body.is_object() {
            return Err(StoreError::Validation(
                "Request body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(body.clone())
            .map_err(|e| StoreError::Validation(format!("Malformed employee data: {}", e)))
    }
}

impl NewEmployee {
    pub fn new(
        name: impl Into<String>,
        department: impl Into<String>,
        salary: f64,
        hire_date: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
            salary,
            hire_date,
        }
    }

    /// Build a `NewEmployee` from a JSON request body.
    ///
    /// `name`, `department` and `salary` are required; `hire_date` is optional.
    pub fn from_json(body: &Value) -> Result<Self, StoreError> {
        let raw = EmployeeBody::from_value(body)?;
        let (Some(name), Some(department), Some(salary)) = (raw.name, raw.department, raw.salary)
        else {
            return Err(StoreError::Validation("Missing data".to_string()));
        };
        let hire_date = raw.hire_date.as_deref().map(parse_hire_date).transpose()?;

        let employee = Self::new(name, department, salary, hire_date);
        employee.validate()?;
        Ok(employee)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        validate_text("name", &self.name)?;
        validate_text("department", &self.department)?;
        validate_salary(self.salary)
    }

    /// The hire date to persist, defaulting to the current local time.
    pub fn hire_date_or_now(&self) -> NaiveDateTime {
        self.hire_date.unwrap_or_else(now_seconds)
    }
}

impl EmployeeUpdate {
    /// Build an update from a JSON request body.
    ///
    /// At least one recognized field must be present.
    pub fn from_json(body: &Value) -> Result<Self, StoreError> {
        let raw = EmployeeBody::from_value(body)?;
        let update = Self {
            name: raw.name,
            department: raw.department,
            salary: raw.salary,
            hire_date: raw.hire_date.as_deref().map(parse_hire_date).transpose()?,
        };
        update.validate()?;
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.department.is_none()
            && self.salary.is_none()
            && self.hire_date.is_none()
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.is_empty() {
            return Err(StoreError::Validation("No data provided".to_string()));
        }
        if let Some(name) = &self.name {
            validate_text("name", name)?;
        }
        if let Some(department) = &self.department {
            validate_text("department", department)?;
        }
        if let Some(salary) = self.salary {
            validate_salary(salary)?;
        }
        Ok(())
    }

    /// Apply this update to a record in place.
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(department) = &self.department {
            employee.department = department.clone();
        }
        if let Some(salary) = self.salary {
            employee.salary = salary;
        }
        if let Some(hire_date) = self.hire_date {
            employee.hire_date = hire_date;
        }
    }
}

fn validate_text(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("'{}' cannot be empty", field)));
    }
    Ok(())
}

fn validate_salary(salary: f64) -> Result<(), StoreError> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(StoreError::Validation(
            "'salary' must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

/// Current local time truncated to whole seconds.
pub fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Parse a client-supplied hire date.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` (fractional seconds
/// are dropped) and a bare `YYYY-MM-DD` meaning midnight. Years must have
/// four digits so stored dates keep a fixed width.
pub fn parse_hire_date(raw: &str) -> Result<NaiveDateTime, StoreError> {
    let raw = raw.trim();
    let parsed = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|parsed| parsed.with_nanosecond(0).unwrap_or(parsed))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| StoreError::Validation(format!("Invalid hire_date '{}'", raw)))?;
    check_year(parsed, raw)
}

/// Parse a hire date in the strict `YYYY-MM-DD HH:MM:SS` form only.
pub fn parse_strict_hire_date(raw: &str) -> Result<NaiveDateTime, StoreError> {
    let parsed = NaiveDateTime::parse_from_str(raw, HIRE_DATE_STRICT_FORMAT).map_err(|_| {
        StoreError::Validation(format!(
            "Invalid hire_date '{}': expected YYYY-MM-DD HH:MM:SS",
            raw
        ))
    })?;
    check_year(parsed, raw)
}

fn check_year(parsed: NaiveDateTime, raw: &str) -> Result<NaiveDateTime, StoreError> {
    if (0..=9999).contains(&parsed.year()) {
        Ok(parsed)
    } else {
        Err(StoreError::Validation(format!(
            "Invalid hire_date '{}': year must be between 0000 and 9999",
            raw
        )))
    }
}

pub(crate) mod hire_date_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::HIRE_DATE_OUTPUT_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(HIRE_DATE_OUTPUT_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hire_date(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_new_employee_requires_all_fields() {
        let err = NewEmployee::from_json(&json!({"department": "Eng"})).unwrap_err();
        assert!(matches!(err, StoreError::Validation(msg) if msg == "Missing data"));
    }

    #[test]
    fn test_new_employee_accepts_integer_salary() {
        let employee =
            NewEmployee::from_json(&json!({"name": "Ada", "department": "Eng", "salary": 150000}))
                .unwrap();
        assert_eq!(employee.salary, 150000.0);
        assert!(employee.hire_date.is_none());
    }

    #[test]
    fn test_new_employee_rejects_bad_values() {
        let negative = json!({"name": "Ada", "department": "Eng", "salary": -1});
        assert!(NewEmployee::from_json(&negative).is_err());

        let textual = json!({"name": "Ada", "department": "Eng", "salary": "lots"});
        assert!(NewEmployee::from_json(&textual).is_err());

        let blank = json!({"name": "  ", "department": "Eng", "salary": 10});
        assert!(NewEmployee::from_json(&blank).is_err());

        assert!(NewEmployee::from_json(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_new_employee_parses_hire_date() {
        let body = json!({
            "name": "Ada",
            "department": "Eng",
            "salary": 1,
            "hire_date": "2021-03-04 05:06:07",
        });
        let employee = NewEmployee::from_json(&body).unwrap();
        assert_eq!(employee.hire_date, Some(at(2021, 3, 4, 5, 6, 7)));
    }

    #[test]
    fn test_update_requires_a_recognized_field() {
        assert!(EmployeeUpdate::from_json(&json!({})).is_err());
        assert!(EmployeeUpdate::from_json(&json!({"nickname": "x"})).is_err());

        let update = EmployeeUpdate::from_json(&json!({"salary": 99.5})).unwrap();
        assert_eq!(update.salary, Some(99.5));
        assert!(update.name.is_none());
    }

    #[test]
    fn test_update_apply_only_touches_supplied_fields() {
        let mut employee = Employee {
            id: 1,
            name: "Ada".to_string(),
            department: "Eng".to_string(),
            salary: 10.0,
            hire_date: at(2020, 1, 1, 0, 0, 0),
        };
        let update = EmployeeUpdate {
            salary: Some(20.0),
            ..Default::default()
        };
        update.apply_to(&mut employee);
        assert_eq!(employee.salary, 20.0);
        assert_eq!(employee.name, "Ada");
        assert_eq!(employee.hire_date, at(2020, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_parse_hire_date_forms() {
        let expected = at(2022, 12, 31, 23, 59, 58);
        assert_eq!(parse_hire_date("2022-12-31 23:59:58").unwrap(), expected);
        assert_eq!(parse_hire_date("2022-12-31T23:59:58.123").unwrap(), expected);
        assert_eq!(
            parse_hire_date("2022-12-31").unwrap(),
            at(2022, 12, 31, 0, 0, 0)
        );
        assert!(parse_hire_date("31/12/2022").is_err());
    }

    #[test]
    fn test_hire_date_year_out_of_range() {
        for raw in ["+10000-01-01", "-0001-01-01", "+10000-01-01 00:00:00"] {
            assert!(
                matches!(parse_hire_date(raw), Err(StoreError::Validation(_))),
                "{}",
                raw
            );
        }
        assert!(parse_strict_hire_date("+10000-01-01 00:00:00").is_err());
        assert!(parse_hire_date("9999-12-31 23:59:59").is_ok());
        assert!(parse_hire_date("0000-01-01").is_ok());
    }

    #[test]
    fn test_strict_hire_date() {
        assert!(parse_strict_hire_date("2022-12-31 23:59:58").is_ok());
        assert!(parse_strict_hire_date("2022-12-31T23:59:58").is_err());
        assert!(parse_strict_hire_date("2022-12-31").is_err());
    }

    #[test]
    fn test_employee_serializes_fixed_fields() {
        let employee = Employee {
            id: 7,
            name: "Ada".to_string(),
            department: "Eng".to_string(),
            salary: 150000.0,
            hire_date: at(2023, 5, 6, 7, 8, 9),
        };
        let value = serde_json::to_value(&employee).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 5);
        assert_eq!(value["hire_date"], "2023-05-06T07:08:09");
        assert_eq!(value["salary"], 150000.0);
    }
}
