//! Collaborator interfaces: the employee/preference store and the
//! natural-language constraint service, plus in-memory implementations.
//!
//! Handles are passed into [`prepare_request`] explicitly; nothing here is
//! a process-wide singleton.

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::{SchedulingConfig, SettingsOverrides};
use crate::domain::Employee;
use crate::error::{SchedulingError, StoreError};
use crate::preferences::{EmployeePreference, ManualConstraint};
use crate::solver::OptimizationRequest;

/// Persistence of employees, preferences and department settings.
pub trait EmployeeStore: Send + Sync {
    /// Employees, optionally limited to one department.
    fn fetch_employees(&self, department: Option<&str>) -> Result<Vec<Employee>, StoreError>;

    fn fetch_preferences(&self) -> Result<Vec<EmployeePreference>, StoreError>;

    fn fetch_settings(&self, department: &str) -> Result<SettingsOverrides, StoreError>;
}

/// Source of already-structured constraints parsed from free text.
pub trait ConstraintSource: Send + Sync {
    fn fetch_constraints(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ManualConstraint>, StoreError>;
}

/// Assembles an [`OptimizationRequest`] from the collaborators.
///
/// Department settings are applied on top of `base_config`; a failing
/// settings fetch keeps the base config. A failing constraint source is
/// treated as "no manual constraints".
///
/// ```
/// use chrono::NaiveDate;
/// use shift_scheduling::config::{SchedulingConfig, SettingsOverrides};
/// use shift_scheduling::domain::Employee;
/// use shift_scheduling::store::{prepare_request, InMemoryStore};
///
/// let store = InMemoryStore::new()
///     .with_employee(Employee::new("e1", "Amy Cole").with_department("ICU"))
///     .with_employee(Employee::new("e2", "Bob Diaz").with_department("ER"))
///     .with_settings("ICU", SettingsOverrides { min_staff_per_shift: Some(2), ..Default::default() });
/// let day = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
///
/// let request = prepare_request(&store, None, Some("ICU"), day, day, SchedulingConfig::default()).unwrap();
/// assert_eq!(request.employees.len(), 1);
/// assert_eq!(request.config.min_staff_per_shift, 2);
/// ```
pub fn prepare_request(
    store: &dyn EmployeeStore,
    constraints: Option<&dyn ConstraintSource>,
    department: Option<&str>,
    start: NaiveDate,
    end: NaiveDate,
    base_config: SchedulingConfig,
) -> Result<OptimizationRequest, SchedulingError> {
    let employees = store.fetch_employees(department)?;
    if employees.is_empty() {
        return Err(SchedulingError::NoEmployees);
    }

    let config = match department {
        Some(dept) => match store.fetch_settings(dept) {
            Ok(overrides) => base_config.with_overrides(&overrides),
            Err(err) => {
                warn!(department = dept, error = %err, "Settings unavailable, using base config");
                base_config
            }
        },
        None => base_config,
    };

    let preferences = store.fetch_preferences()?;
    let manual = match constraints {
        Some(source) => source.fetch_constraints(start, end).unwrap_or_else(|err| {
            warn!(error = %err, "Constraint service unavailable, continuing without manual constraints");
            Vec::new()
        }),
        None => Vec::new(),
    };

    info!(
        employees = employees.len(),
        preferences = preferences.len(),
        manual_constraints = manual.len(),
        department = department.unwrap_or("all"),
        "Request prepared"
    );

    Ok(OptimizationRequest::new(employees, start, end)
        .with_config(config)
        .with_preferences(preferences)
        .with_manual_constraints(manual))
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    employees: RwLock<Vec<Employee>>,
    preferences: RwLock<Vec<EmployeePreference>>,
    settings: RwLock<HashMap<String, SettingsOverrides>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employee(self, employee: Employee) -> Self {
        self.employees.write().push(employee);
        self
    }

    pub fn with_preference(self, preference: EmployeePreference) -> Self {
        self.upsert_preference(preference);
        self
    }

    pub fn with_settings(self, department: &str, overrides: SettingsOverrides) -> Self {
        self.settings.write().insert(department.to_string(), overrides);
        self
    }

    /// Replaces the preference of the same employee, if any.
    pub fn upsert_preference(&self, preference: EmployeePreference) {
        let mut prefs = self.preferences.write();
        match prefs
            .iter_mut()
            .find(|p| p.employee_id == preference.employee_id)
        {
            Some(existing) => *existing = preference,
            None => prefs.push(preference),
        }
    }
}

impl EmployeeStore for InMemoryStore {
    fn fetch_employees(&self, department: Option<&str>) -> Result<Vec<Employee>, StoreError> {
        Ok(self
            .employees
            .read()
            .iter()
            .filter(|e| department.map_or(true, |d| e.department == d))
            .cloned()
            .collect())
    }

    fn fetch_preferences(&self) -> Result<Vec<EmployeePreference>, StoreError> {
        Ok(self.preferences.read().clone())
    }

    fn fetch_settings(&self, department: &str) -> Result<SettingsOverrides, StoreError> {
        self.settings
            .read()
            .get(department)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("settings for department '{}'", department)))
    }
}

/// Constraint source serving a fixed list, filtered to the requested range.
#[derive(Debug, Clone, Default)]
pub struct StaticConstraints(pub Vec<ManualConstraint>);

impl ConstraintSource for StaticConstraints {
    fn fetch_constraints(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ManualConstraint>, StoreError> {
        Ok(self
            .0
            .iter()
            .filter(|c| c.dates.iter().any(|d| (start..=end).contains(d)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unavailable;

    impl ConstraintSource for Unavailable {
        fn fetch_constraints(
            &self,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<ManualConstraint>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new()
            .with_employee(Employee::new("e1", "Amy Cole").with_department("ICU"))
            .with_employee(Employee::new("e2", "Bob Diaz").with_department("ICU"))
            .with_employee(Employee::new("e3", "Cem Eke").with_department("ER"))
            .with_preference(EmployeePreference::new("e1").with_max_shifts_per_week(3))
    }

    #[test]
    fn test_department_filter() {
        let s = store();
        assert_eq!(s.fetch_employees(None).unwrap().len(), 3);
        assert_eq!(s.fetch_employees(Some("ER")).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_roster() {
        let err = prepare_request(
            &store(),
            None,
            Some("Radiology"),
            date(1),
            date(7),
            SchedulingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SchedulingError::NoEmployees));
    }

    #[test]
    fn test_missing_settings_keep_base() {
        let base = SchedulingConfig::default().with_min_experience(3);
        let request =
            prepare_request(&store(), None, Some("ICU"), date(1), date(7), base).unwrap();
        assert_eq!(request.config.min_experience_per_shift, 3);
        assert_eq!(request.employees.len(), 2);
        assert_eq!(request.preferences.len(), 1);
    }

    #[test]
    fn test_manual_constraints_filtered_and_optional() {
        let source = StaticConstraints(vec![
            ManualConstraint::new("e1", vec![date(2)], true),
            ManualConstraint::new("e2", vec![date(20)], false),
        ]);
        let request = prepare_request(
            &store(),
            Some(&source),
            None,
            date(1),
            date(7),
            SchedulingConfig::default(),
        )
        .unwrap();
        assert_eq!(request.manual_constraints.len(), 1);

        let request = prepare_request(
            &store(),
            Some(&Unavailable),
            None,
            date(1),
            date(7),
            SchedulingConfig::default(),
        )
        .unwrap();
        assert!(request.manual_constraints.is_empty());
    }

    #[test]
    fn test_upsert_preference() {
        let s = store();
        s.upsert_preference(EmployeePreference::new("e1").with_max_shifts_per_week(2));
        let prefs = s.fetch_preferences().unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].max_shifts_per_week, Some(2));
    }
}
