//! Domain model for shift scheduling.
//!
//! - [`ShiftType`]: the fixed day/evening/night catalog with its time windows
//! - [`Employee`]: immutable roster entry for one optimization run
//! - [`ScheduleAssignment`]: one solved row of the output schedule

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hourly rate assumed when the roster carries none.
pub const DEFAULT_HOURLY_RATE: f64 = 1000.0;

/// Department assumed when the roster carries none.
pub const DEFAULT_DEPARTMENT: &str = "General";

/// One of the three recurring shifts of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Day,
    Evening,
    Night,
}

impl ShiftType {
    /// All shift types in catalog order.
    pub const ALL: [ShiftType; 3] = [ShiftType::Day, ShiftType::Evening, ShiftType::Night];

    /// Position in [`ShiftType::ALL`].
    pub fn index(self) -> usize {
        match self {
            ShiftType::Day => 0,
            ShiftType::Evening => 1,
            ShiftType::Night => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Day => "day",
            ShiftType::Evening => "evening",
            ShiftType::Night => "night",
        }
    }

    /// Time window of this shift.
    ///
    /// ```
    /// use shift_scheduling::domain::ShiftType;
    ///
    /// let night = ShiftType::Night.window();
    /// assert!(night.wraps_midnight());
    /// assert_eq!(night.duration_hours(), 8.0);
    /// ```
    pub fn window(self) -> ShiftWindow {
        match self {
            ShiftType::Day => ShiftWindow::new(hm(6, 0), hm(14, 0)),
            ShiftType::Evening => ShiftWindow::new(hm(14, 0), hm(22, 0)),
            ShiftType::Night => ShiftWindow::new(hm(22, 0), hm(6, 0)),
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "dag" => Ok(ShiftType::Day),
            "evening" | "kväll" | "kvällspass" => Ok(ShiftType::Evening),
            "night" | "natt" | "nattpass" => Ok(ShiftType::Night),
            other => Err(format!("unknown shift type '{}'", other)),
        }
    }
}

/// Start and end time-of-day of a shift. The end may fall on the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ShiftWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// True when the shift ends on the calendar day after it starts.
    pub fn wraps_midnight(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_hours(&self) -> f64 {
        let minutes = if self.wraps_midnight() {
            (Duration::hours(24) - (self.start - self.end)).num_minutes()
        } else {
            (self.end - self.start).num_minutes()
        };
        minutes as f64 / 60.0
    }

    pub fn starts_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    pub fn ends_at(&self, date: NaiveDate) -> NaiveDateTime {
        let end = date.and_time(self.end);
        if self.wraps_midnight() {
            end + Duration::days(1)
        } else {
            end
        }
    }
}

/// An employee who can be assigned to shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(default = "default_department")]
    pub department: String,
    /// Role used by the night-shift qualification gate.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_experience")]
    pub experience_level: u32,
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate: f64,
    /// Fraction of full time, 0–100.
    #[serde(default = "default_work_percentage")]
    pub work_percentage: u32,
}

fn default_department() -> String {
    DEFAULT_DEPARTMENT.to_string()
}

fn default_experience() -> u32 {
    1
}

fn default_hourly_rate() -> f64 {
    DEFAULT_HOURLY_RATE
}

fn default_work_percentage() -> u32 {
    100
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            department: default_department(),
            role: None,
            experience_level: default_experience(),
            hourly_rate: default_hourly_rate(),
            work_percentage: default_work_percentage(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_experience(mut self, level: u32) -> Self {
        self.experience_level = level;
        self
    }

    pub fn with_hourly_rate(mut self, rate: f64) -> Self {
        self.hourly_rate = rate;
        self
    }

    pub fn with_work_percentage(mut self, percentage: u32) -> Self {
        self.work_percentage = percentage.min(100);
        self
    }
}

/// One solved row of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAssignment {
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub hours: f64,
    pub hourly_rate: f64,
    pub cost: f64,
    pub experience_level: u32,
    pub is_weekend: bool,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
