//! Proportional work-time caps and pre-solve capacity checks.

use serde::Serialize;
use std::ops::Range;

use crate::config::SchedulingConfig;
use crate::domain::{Employee, ShiftType};
use crate::error::SchedulingError;
use crate::period::SchedulingPeriod;

/// Legal maximum of shifts in any 7-day window at full time.
pub const LEGAL_MAX_SHIFTS_PER_WEEK: u32 = 5;

/// Shorter periods get only the whole-period cap.
pub const MIN_DAYS_FOR_WEEKLY_CAP: usize = 5;

/// Cap for a window of `window_len` days.
///
/// ```
/// use shift_scheduling::capacity::weekly_cap;
///
/// assert_eq!(weekly_cap(100, 7), 5);
/// assert_eq!(weekly_cap(50, 7), 2);
/// assert_eq!(weekly_cap(10, 7), 1);
/// assert_eq!(weekly_cap(0, 7), 0);
/// ```
pub fn weekly_cap(work_percentage: u32, window_len: usize) -> u32 {
    if work_percentage == 0 {
        return 0;
    }
    let base = LEGAL_MAX_SHIFTS_PER_WEEK.min(window_len as u32);
    (base * work_percentage.min(100) / 100).max(1)
}

/// Cap over the whole period of `n_days` days.
///
/// ```
/// use shift_scheduling::capacity::period_cap;
///
/// assert_eq!(period_cap(50, 28), 10);
/// assert_eq!(period_cap(100, 1), 1);
/// assert_eq!(period_cap(50, 1), 0);
/// ```
pub fn period_cap(work_percentage: u32, n_days: usize) -> u32 {
    if work_percentage == 0 {
        return 0;
    }
    let raw = f64::from(work_percentage.min(100)) / 100.0
        * (n_days as f64 / 7.0)
        * f64::from(LEGAL_MAX_SHIFTS_PER_WEEK);
    let cap = raw.floor() as u32;
    if cap == 0 && raw >= 0.5 {
        1
    } else {
        cap
    }
}

/// Sliding 7-day windows of a period; one whole-period window for 5-6 days.
pub fn weekly_windows(n_days: usize) -> Vec<Range<usize>> {
    if n_days < MIN_DAYS_FOR_WEEKLY_CAP {
        Vec::new()
    } else if n_days < 7 {
        vec![0..n_days]
    } else {
        (0..=n_days - 7).map(|start| start..start + 7).collect()
    }
}

/// Pre-solve arithmetic of what is required against what is possible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReport {
    pub required_person_shifts: u32,
    pub available_person_shifts: u32,
    pub required_experience: u32,
    pub available_experience: u32,
    /// Upper bound on reachable coverage of the required positions.
    pub expected_coverage_percentage: f64,
}

impl CapacityReport {
    pub fn assess(employees: &[Employee], period: &SchedulingPeriod, config: &SchedulingConfig) -> Self {
        let required_days = period.working_days() as u32;
        let required_person_shifts: u32 = ShiftType::ALL
            .iter()
            .map(|s| config.staffing_for(*s).min_staff * required_days)
            .sum();
        let available_person_shifts: u32 = employees
            .iter()
            .map(|e| period_cap(e.work_percentage, period.len()).min(period.len() as u32))
            .sum();
        let required_experience = if required_days == 0 {
            0
        } else {
            ShiftType::ALL
                .iter()
                .map(|s| config.staffing_for(*s))
                .filter(|b| b.min_staff > 0)
                .map(|b| b.min_experience)
                .max()
                .unwrap_or(0)
        };
        let available_experience = employees.iter().map(|e| e.experience_level).sum();
        let expected_coverage_percentage = if required_person_shifts == 0 {
            100.0
        } else {
            let ratio = f64::from(available_person_shifts) / f64::from(required_person_shifts);
            (ratio.min(1.0) * 1000.0).round() / 10.0
        };

        Self {
            required_person_shifts,
            available_person_shifts,
            required_experience,
            available_experience,
            expected_coverage_percentage,
        }
    }

    /// Fails fast unless partial coverage is allowed.
    pub fn check(
        &self,
        employees: usize,
        period: &SchedulingPeriod,
        allow_partial: bool,
    ) -> Result<(), SchedulingError> {
        if allow_partial {
            return Ok(());
        }
        if self.required_person_shifts > self.available_person_shifts {
            return Err(SchedulingError::InsufficientStaffCapacity {
                required: self.required_person_shifts,
                available: self.available_person_shifts,
                employees,
                weeks: period.total_weeks(),
            });
        }
        if self.required_experience > self.available_experience {
            return Err(SchedulingError::InsufficientExperienceCapacity {
                required: self.required_experience,
                available: self.available_experience,
                employees,
            });
        }
        Ok(())
    }
}
