//! Scheduling configuration.
//!
//! Every option has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```
//! use shift_scheduling::config::SchedulingConfig;
//! use shift_scheduling::domain::ShiftType;
//! use std::time::Duration;
//!
//! let config = SchedulingConfig::from_toml_str(r#"
//!     min_staff_per_shift = 2
//!     min_experience_per_shift = 4
//!     include_weekends = false
//!
//!     [termination]
//!     initial_seconds = 20
//!
//!     [shifts.night]
//!     min_staff = 1
//!     min_experience = 2
//! "#).unwrap();
//!
//! assert_eq!(config.staffing_for(ShiftType::Day).max_staff, 2);
//! assert_eq!(config.staffing_for(ShiftType::Night).min_experience, 2);
//! assert_eq!(config.termination.initial_time_limit(), Duration::from_secs(20));
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::ShiftType;
use crate::error::ConfigError;

/// Longest planning horizon accepted, in days.
pub const DEFAULT_MAX_PERIOD_DAYS: u32 = 31;

/// Main scheduling configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SchedulingConfig {
    pub min_staff_per_shift: u32,
    /// Upper staffing bound; `None` means exactly `min_staff_per_shift`.
    pub max_staff_per_shift: Option<u32>,
    pub min_experience_per_shift: u32,
    pub include_weekends: bool,
    /// Turns staffing minimums and experience into targets instead of constraints.
    pub allow_partial_coverage: bool,
    pub optimize_for_cost: bool,
    pub random_seed: Option<u64>,
    pub max_period_days: u32,
    pub coverage_denominator: CoverageDenominator,
    pub qualification: QualificationConfig,
    pub termination: TerminationConfig,
    pub shifts: ShiftOverrides,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            min_staff_per_shift: 1,
            max_staff_per_shift: None,
            min_experience_per_shift: 1,
            include_weekends: true,
            allow_partial_coverage: false,
            optimize_for_cost: false,
            random_seed: None,
            max_period_days: DEFAULT_MAX_PERIOD_DAYS,
            coverage_denominator: CoverageDenominator::default(),
            qualification: QualificationConfig::default(),
            termination: TerminationConfig::default(),
            shifts: ShiftOverrides::default(),
        }
    }
}

impl SchedulingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, contains invalid TOML or
    /// describes an inconsistent configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks staffing bounds and the period limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_period_days == 0 {
            return Err(ConfigError::Invalid("max_period_days must be positive".into()));
        }
        for shift in ShiftType::ALL {
            let bounds = self.staffing_for(shift);
            if bounds.max_staff < bounds.min_staff {
                return Err(ConfigError::Invalid(format!(
                    "{} shift: max staff {} is below min staff {}",
                    shift, bounds.max_staff, bounds.min_staff
                )));
            }
        }
        Ok(())
    }

    /// Effective staffing bounds of one shift type.
    ///
    /// A shift override that sets `min_staff` without `max_staff` closes the
    /// slot at that minimum rather than inheriting the global maximum.
    pub fn staffing_for(&self, shift: ShiftType) -> StaffingBounds {
        let overrides = self.shifts.get(shift);
        let min_staff = overrides
            .and_then(|o| o.min_staff)
            .unwrap_or(self.min_staff_per_shift);
        let max_staff = match overrides {
            Some(o) if o.max_staff.is_some() => o.max_staff,
            Some(o) if o.min_staff.is_some() => None,
            _ => self.max_staff_per_shift,
        }
        .unwrap_or(min_staff);
        let min_experience = overrides
            .and_then(|o| o.min_experience)
            .unwrap_or(self.min_experience_per_shift);

        StaffingBounds {
            min_staff,
            max_staff,
            min_experience,
        }
    }

    /// Highest experience requirement over the shift types.
    pub fn max_experience_requirement(&self) -> u32 {
        ShiftType::ALL
            .iter()
            .map(|s| self.staffing_for(*s).min_experience)
            .max()
            .unwrap_or(self.min_experience_per_shift)
    }

    /// Applies department settings on top of this configuration.
    pub fn with_overrides(mut self, overrides: &SettingsOverrides) -> Self {
        if let Some(v) = overrides.min_staff_per_shift {
            self.min_staff_per_shift = v;
        }
        if let Some(v) = overrides.max_staff_per_shift {
            self.max_staff_per_shift = Some(v);
        }
        if let Some(v) = overrides.min_experience_per_shift {
            self.min_experience_per_shift = v;
        }
        if let Some(v) = overrides.include_weekends {
            self.include_weekends = v;
        }
        if let Some(v) = overrides.allow_partial_coverage {
            self.allow_partial_coverage = v;
        }
        if let Some(v) = overrides.optimize_for_cost {
            self.optimize_for_cost = v;
        }
        self
    }

    pub fn with_min_staff(mut self, min_staff: u32) -> Self {
        self.min_staff_per_shift = min_staff;
        self
    }

    pub fn with_max_staff(mut self, max_staff: u32) -> Self {
        self.max_staff_per_shift = Some(max_staff);
        self
    }

    pub fn with_min_experience(mut self, experience: u32) -> Self {
        self.min_experience_per_shift = experience;
        self
    }

    pub fn with_weekends(mut self, include: bool) -> Self {
        self.include_weekends = include;
        self
    }

    pub fn with_partial_coverage(mut self, allow: bool) -> Self {
        self.allow_partial_coverage = allow;
        self
    }

    pub fn with_cost_optimization(mut self, enabled: bool) -> Self {
        self.optimize_for_cost = enabled;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_shift_override(mut self, shift: ShiftType, staffing: ShiftStaffing) -> Self {
        *self.shifts.get_mut(shift) = Some(staffing);
        self
    }

    /// Sets the solver budgets of the first and of each relaxed attempt.
    pub fn with_time_limits(mut self, initial_seconds: u64, relaxation_seconds: u64) -> Self {
        self.termination = TerminationConfig {
            initial_seconds,
            relaxation_seconds,
        };
        self
    }
}

/// Resolved staffing bounds of one shift type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffingBounds {
    pub min_staff: u32,
    pub max_staff: u32,
    pub min_experience: u32,
}

/// Optional per-shift-type override of the global staffing settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShiftStaffing {
    pub min_staff: Option<u32>,
    pub max_staff: Option<u32>,
    pub min_experience: Option<u32>,
}

/// `[shifts.day]`, `[shifts.evening]` and `[shifts.night]` tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShiftOverrides {
    pub day: Option<ShiftStaffing>,
    pub evening: Option<ShiftStaffing>,
    pub night: Option<ShiftStaffing>,
}

impl ShiftOverrides {
    pub fn get(&self, shift: ShiftType) -> Option<&ShiftStaffing> {
        match shift {
            ShiftType::Day => self.day.as_ref(),
            ShiftType::Evening => self.evening.as_ref(),
            ShiftType::Night => self.night.as_ref(),
        }
    }

    fn get_mut(&mut self, shift: ShiftType) -> &mut Option<ShiftStaffing> {
        match shift {
            ShiftType::Day => &mut self.day,
            ShiftType::Evening => &mut self.evening,
            ShiftType::Night => &mut self.night,
        }
    }
}

/// Denominator of the coverage percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageDenominator {
    /// `days × shift types`.
    #[default]
    Slots,
    /// Sum of the minimum staff over every day and shift type.
    StaffedPositions,
}

/// Night-shift qualification gate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QualificationConfig {
    pub require_night_qualification: bool,
    pub night_qualified_roles: Vec<String>,
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            require_night_qualification: true,
            night_qualified_roles: vec!["Doctor".to_string(), "Nurse".to_string()],
        }
    }
}

impl QualificationConfig {
    /// Whether an employee with `role` may work night shifts.
    ///
    /// Employees without a recorded role are not gated.
    pub fn allows_night(&self, role: Option<&str>) -> bool {
        match role {
            Some(role) if self.require_night_qualification => self
                .night_qualified_roles
                .iter()
                .any(|r| r.eq_ignore_ascii_case(role)),
            _ => true,
        }
    }
}

/// Solver time budgets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TerminationConfig {
    /// Budget of the first attempt.
    pub initial_seconds: u64,
    /// Budget of each relaxation attempt.
    pub relaxation_seconds: u64,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            initial_seconds: 30,
            relaxation_seconds: 10,
        }
    }
}

impl TerminationConfig {
    pub fn initial_time_limit(&self) -> Duration {
        Duration::from_secs(self.initial_seconds)
    }

    pub fn relaxation_time_limit(&self) -> Duration {
        Duration::from_secs(self.relaxation_seconds)
    }
}

/// Department settings fetched from the employee store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsOverrides {
    pub min_staff_per_shift: Option<u32>,
    pub max_staff_per_shift: Option<u32>,
    pub min_experience_per_shift: Option<u32>,
    pub include_weekends: Option<bool>,
    pub allow_partial_coverage: Option<bool>,
    pub optimize_for_cost: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulingConfig::from_toml_str("").unwrap();
        assert_eq!(config, SchedulingConfig::default());
        assert_eq!(config.min_staff_per_shift, 1);
        assert_eq!(config.min_experience_per_shift, 1);
        assert!(config.include_weekends);
        assert!(!config.allow_partial_coverage);
        assert!(!config.optimize_for_cost);
        assert_eq!(config.max_period_days, 31);
        assert_eq!(config.coverage_denominator, CoverageDenominator::Slots);
    }

    #[test]
    fn test_max_defaults_to_min() {
        let config = SchedulingConfig::new().with_min_staff(2);
        let bounds = config.staffing_for(ShiftType::Evening);
        assert_eq!(bounds.min_staff, 2);
        assert_eq!(bounds.max_staff, 2);
    }

    #[test]
    fn test_widened_max() {
        let config = SchedulingConfig::new().with_min_staff(2).with_max_staff(4);
        assert_eq!(config.staffing_for(ShiftType::Day).max_staff, 4);
    }

    #[test]
    fn test_shift_override_closes_slot() {
        let config = SchedulingConfig::new().with_max_staff(3).with_shift_override(
            ShiftType::Night,
            ShiftStaffing {
                min_staff: Some(0),
                ..Default::default()
            },
        );
        let night = config.staffing_for(ShiftType::Night);
        assert_eq!(night.min_staff, 0);
        assert_eq!(night.max_staff, 0);
        assert_eq!(config.staffing_for(ShiftType::Day).max_staff, 3);
    }

    #[test]
    fn test_max_experience_requirement() {
        let config = SchedulingConfig::new().with_min_experience(2).with_shift_override(
            ShiftType::Day,
            ShiftStaffing {
                min_experience: Some(5),
                ..Default::default()
            },
        );
        assert_eq!(config.max_experience_requirement(), 5);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = SchedulingConfig::from_toml_str(
            r#"
            min_staff_per_shift = 3
            max_staff_per_shift = 2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_toml() {
        let err = SchedulingConfig::from_toml_str("min_staff_per_shift = \"two\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_coverage_denominator_parsing() {
        let config =
            SchedulingConfig::from_toml_str("coverage_denominator = \"staffed_positions\"").unwrap();
        assert_eq!(config.coverage_denominator, CoverageDenominator::StaffedPositions);
    }

    #[test]
    fn test_qualification_gate() {
        let gate = QualificationConfig::default();
        assert!(gate.allows_night(Some("Nurse")));
        assert!(gate.allows_night(Some("doctor")));
        assert!(!gate.allows_night(Some("Assistant")));
        assert!(gate.allows_night(None));

        let disabled = QualificationConfig {
            require_night_qualification: false,
            ..Default::default()
        };
        assert!(disabled.allows_night(Some("Assistant")));
    }

    #[test]
    fn test_settings_overrides() {
        let overrides = SettingsOverrides {
            min_staff_per_shift: Some(2),
            include_weekends: Some(false),
            ..Default::default()
        };
        let config = SchedulingConfig::new().with_overrides(&overrides);
        assert_eq!(config.min_staff_per_shift, 2);
        assert!(!config.include_weekends);
        assert_eq!(config.min_experience_per_shift, 1);
    }

    #[test]
    fn test_missing_file() {
        let err = SchedulingConfig::load("/nonexistent/scheduling.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
