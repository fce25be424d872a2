//! JSON problem document read and written by the binary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{SchedulingConfig, SettingsOverrides};
use crate::domain::Employee;
use crate::preferences::{EmployeePreference, ManualConstraint};
use crate::solver::OptimizationRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDto {
    pub employees: Vec<Employee>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub preferences: Vec<EmployeePreference>,
    #[serde(default)]
    pub manual_constraints: Vec<ManualConstraint>,
    /// Applied on top of the binary's configuration.
    #[serde(default)]
    pub settings: SettingsOverrides,
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl ProblemDto {
    pub fn from_request(request: &OptimizationRequest) -> Self {
        let config = &request.config;
        Self {
            employees: request.employees.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            preferences: request.preferences.clone(),
            manual_constraints: request.manual_constraints.clone(),
            settings: SettingsOverrides {
                min_staff_per_shift: Some(config.min_staff_per_shift),
                max_staff_per_shift: config.max_staff_per_shift,
                min_experience_per_shift: Some(config.min_experience_per_shift),
                include_weekends: Some(config.include_weekends),
                allow_partial_coverage: Some(config.allow_partial_coverage),
                optimize_for_cost: Some(config.optimize_for_cost),
            },
            random_seed: config.random_seed,
        }
    }

    pub fn to_request(&self, base: SchedulingConfig) -> OptimizationRequest {
        let mut config = base.with_overrides(&self.settings);
        if self.random_seed.is_some() {
            config.random_seed = self.random_seed;
        }
        OptimizationRequest::new(self.employees.clone(), self.start_date, self.end_date)
            .with_config(config)
            .with_preferences(self.preferences.clone())
            .with_manual_constraints(self.manual_constraints.clone())
    }
}
