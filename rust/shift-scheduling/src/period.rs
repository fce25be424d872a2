//! Planning horizon: an inclusive date range expanded into ordered days.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::SchedulingError;

/// One calendar day of the planning horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningDay {
    /// Position in [`SchedulingPeriod::days`].
    pub index: usize,
    pub date: NaiveDate,
    pub weekday: Weekday,
    /// False for weekend days when weekends are left out of required coverage.
    pub coverage_required: bool,
}

impl PlanningDay {
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday, Weekday::Sat | Weekday::Sun)
    }
}

/// Ordered days between an inclusive start and end date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingPeriod {
    days: Vec<PlanningDay>,
}

impl SchedulingPeriod {
    /// Expands `start..=end` into planning days.
    ///
    /// # Errors
    ///
    /// [`SchedulingError::InvalidPeriod`] when the day count is not in
    /// `1..=max_days`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use shift_scheduling::period::SchedulingPeriod;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();
    /// let period = SchedulingPeriod::new(start, end, false, 31).unwrap();
    ///
    /// assert_eq!(period.len(), 7);
    /// // 2024-08-03 is a Saturday
    /// assert!(!period.days()[2].coverage_required);
    /// ```
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        include_weekends: bool,
        max_days: u32,
    ) -> Result<Self, SchedulingError> {
        let count = (end - start).num_days() + 1;
        if count <= 0 || count > i64::from(max_days) {
            return Err(SchedulingError::InvalidPeriod {
                days: count,
                max: max_days,
            });
        }

        let days = (0..count)
            .map(|offset| {
                let date = start + Duration::days(offset);
                let weekday = date.weekday();
                let weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);
                PlanningDay {
                    index: offset as usize,
                    date,
                    weekday,
                    coverage_required: include_weekends || !weekend,
                }
            })
            .collect();

        Ok(Self { days })
    }

    pub fn days(&self) -> &[PlanningDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn start(&self) -> NaiveDate {
        self.days[0].date
    }

    pub fn end(&self) -> NaiveDate {
        self.days[self.days.len() - 1].date
    }

    /// Index of `date`, if it falls inside the period.
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start()).num_days();
        if offset < 0 || offset >= self.days.len() as i64 {
            None
        } else {
            Some(offset as usize)
        }
    }

    /// Length in (possibly fractional) weeks.
    pub fn total_weeks(&self) -> f64 {
        self.days.len() as f64 / 7.0
    }

    /// Number of days that require coverage.
    pub fn working_days(&self) -> usize {
        self.days.iter().filter(|d| d.coverage_required).count()
    }
}
