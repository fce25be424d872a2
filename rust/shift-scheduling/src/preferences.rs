//! Employee preferences and manual constraints.
//!
//! Raw records arrive loosely typed (weekday and shift names as strings,
//! dates as text). [`RuleBook::compile`] validates them once against the
//! roster and the period and turns them into closed [`PreferenceRule`]
//! variants. Anything that does not resolve is skipped and reported as a
//! [`ValidationNote`] instead of failing the run.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use crate::domain::{Employee, ShiftType};
use crate::period::{PlanningDay, SchedulingPeriod};

/// Most hard-blocked, and separately medium-blocked, slots one preference may carry.
pub const MAX_BLOCKED_SLOTS: usize = 3;

/// Per-employee preference record as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeePreference {
    pub employee_id: String,
    /// Weekday names the employee can work. Empty means every day.
    pub available_days: Vec<String>,
    pub available_days_strict: bool,
    pub excluded_days: Vec<String>,
    /// Shift names the employee prefers. Empty means no preference.
    pub preferred_shifts: Vec<String>,
    pub preferred_shifts_strict: bool,
    pub excluded_shifts: Vec<String>,
    pub hard_blocked_slots: Vec<BlockedSlot>,
    pub medium_blocked_slots: Vec<BlockedSlot>,
    pub max_shifts_per_week: Option<i64>,
}

impl EmployeePreference {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            ..Default::default()
        }
    }

    pub fn with_available_days(mut self, days: &[&str], strict: bool) -> Self {
        self.available_days = days.iter().map(|d| d.to_string()).collect();
        self.available_days_strict = strict;
        self
    }

    pub fn with_excluded_days(mut self, days: &[&str]) -> Self {
        self.excluded_days = days.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_preferred_shifts(mut self, shifts: &[&str], strict: bool) -> Self {
        self.preferred_shifts = shifts.iter().map(|s| s.to_string()).collect();
        self.preferred_shifts_strict = strict;
        self
    }

    pub fn with_excluded_shifts(mut self, shifts: &[&str]) -> Self {
        self.excluded_shifts = shifts.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_hard_block(mut self, date: &str, shifts: &[&str]) -> Self {
        self.hard_blocked_slots.push(BlockedSlot::new(date, shifts));
        self
    }

    pub fn with_medium_block(mut self, date: &str, shifts: &[&str]) -> Self {
        self.medium_blocked_slots.push(BlockedSlot::new(date, shifts));
        self
    }

    pub fn with_max_shifts_per_week(mut self, max: i64) -> Self {
        self.max_shifts_per_week = Some(max);
        self
    }
}

/// An exact date with the shifts blocked on it. `all_day` blocks all three.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockedSlot {
    pub date: String,
    pub shift_types: Vec<String>,
}

impl BlockedSlot {
    pub fn new(date: &str, shifts: &[&str]) -> Self {
        Self {
            date: date.to_string(),
            shift_types: shifts.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Structured rule produced by the natural-language constraint service or
/// entered manually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualConstraint {
    pub employee_id: String,
    pub dates: Vec<NaiveDate>,
    /// Empty means the whole day.
    #[serde(default)]
    pub shift_types: Vec<String>,
    #[serde(default = "default_hard")]
    pub is_hard: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_hard() -> bool {
    true
}

impl ManualConstraint {
    pub fn new(employee_id: impl Into<String>, dates: Vec<NaiveDate>, is_hard: bool) -> Self {
        Self {
            employee_id: employee_id.into(),
            dates,
            shift_types: Vec::new(),
            is_hard,
            description: None,
        }
    }

    pub fn with_shifts(mut self, shifts: &[&str]) -> Self {
        self.shift_types = shifts.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// One validated rule of one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceRule {
    HardBlockedSlot { day: usize, shifts: Vec<ShiftType> },
    MediumBlockedSlot { day: usize, shifts: Vec<ShiftType> },
    ExcludedDay(Weekday),
    ExcludedShift(ShiftType),
    DayPreference { days: Vec<Weekday>, strict: bool },
    ShiftPreference { shifts: Vec<ShiftType>, strict: bool },
    WeeklyLimit(u32),
    Manual { day: usize, shifts: Vec<ShiftType>, hard: bool },
}

/// Why a variable is forced to zero by an employee rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Exclusion {
    ExcludedShift,
    ExcludedDay,
    UnavailableDay,
    NonPreferredShift,
    HardBlocked,
    ManualBlock,
}

impl PreferenceRule {
    /// The exclusion this rule imposes on `(day, shift)`, if any.
    ///
    /// Manual rules only count when hard.
    pub fn excludes(&self, day: &PlanningDay, shift: ShiftType) -> Option<Exclusion> {
        match self {
            PreferenceRule::ExcludedShift(s) if *s == shift => Some(Exclusion::ExcludedShift),
            PreferenceRule::ExcludedDay(w) if *w == day.weekday => Some(Exclusion::ExcludedDay),
            PreferenceRule::DayPreference { days, strict: true } if !days.contains(&day.weekday) => {
                Some(Exclusion::UnavailableDay)
            }
            PreferenceRule::ShiftPreference {
                shifts,
                strict: true,
            } if !shifts.contains(&shift) => Some(Exclusion::NonPreferredShift),
            PreferenceRule::HardBlockedSlot { day: d, shifts }
                if *d == day.index && shifts.contains(&shift) =>
            {
                Some(Exclusion::HardBlocked)
            }
            PreferenceRule::Manual {
                day: d,
                shifts,
                hard: true,
            } if *d == day.index && shifts.contains(&shift) => Some(Exclusion::ManualBlock),
            _ => None,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, PreferenceRule::Manual { .. })
    }
}

/// Non-fatal problem found while compiling preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationNote {
    pub employee_id: Option<String>,
    pub message: String,
}

/// Validated rules of every employee, indexed like the roster.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: Vec<Vec<PreferenceRule>>,
    notes: Vec<ValidationNote>,
}

impl RuleBook {
    /// Rules for a roster with no preferences at all.
    pub fn empty(n_employees: usize) -> Self {
        Self {
            rules: vec![Vec::new(); n_employees],
            notes: Vec::new(),
        }
    }

    /// Validates raw preferences and manual constraints.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use shift_scheduling::domain::Employee;
    /// use shift_scheduling::period::SchedulingPeriod;
    /// use shift_scheduling::preferences::{EmployeePreference, RuleBook};
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2024, 8, 2).unwrap();
    /// let period = SchedulingPeriod::new(start, end, true, 31).unwrap();
    /// let employees = vec![Employee::new("e1", "Amy Cole")];
    /// let prefs = vec![EmployeePreference::new("e1")
    ///     .with_hard_block("2024-08-02", &["evening"])
    ///     .with_excluded_days(&["funday"])];
    ///
    /// let book = RuleBook::compile(&employees, &period, &prefs, &[]);
    /// assert_eq!(book.rules_for(0).len(), 1);
    /// assert_eq!(book.notes().len(), 1);
    /// ```
    pub fn compile(
        employees: &[Employee],
        period: &SchedulingPeriod,
        preferences: &[EmployeePreference],
        manual: &[ManualConstraint],
    ) -> Self {
        let index: HashMap<&str, usize> = employees
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.as_str(), i))
            .collect();
        let mut book = Self::empty(employees.len());

        for pref in preferences {
            match index.get(pref.employee_id.as_str()) {
                Some(&e) => book.ingest_preference(e, pref, period),
                None => book.note(
                    Some(&pref.employee_id),
                    "preference for unknown employee skipped".to_string(),
                ),
            }
        }

        for constraint in manual {
            match index.get(constraint.employee_id.as_str()) {
                Some(&e) => book.ingest_manual(e, constraint, period),
                None => book.note(
                    Some(&constraint.employee_id),
                    "manual constraint for unknown employee skipped".to_string(),
                ),
            }
        }

        book
    }

    fn ingest_preference(&mut self, e: usize, pref: &EmployeePreference, period: &SchedulingPeriod) {
        let id = pref.employee_id.as_str();

        if !pref.available_days.is_empty() {
            let days = self.parse_weekdays(id, "available day", &pref.available_days);
            if days.is_empty() {
                self.note(Some(id), "no valid available days, availability ignored".to_string());
            } else {
                self.rules[e].push(PreferenceRule::DayPreference {
                    days,
                    strict: pref.available_days_strict,
                });
            }
        }

        for weekday in self.parse_weekdays(id, "excluded day", &pref.excluded_days) {
            self.rules[e].push(PreferenceRule::ExcludedDay(weekday));
        }

        let excluded = self.parse_shifts(id, "excluded shift", &pref.excluded_shifts);
        for shift in &excluded {
            self.rules[e].push(PreferenceRule::ExcludedShift(*shift));
        }

        if !pref.preferred_shifts.is_empty() {
            let shifts = self.parse_shifts(id, "preferred shift", &pref.preferred_shifts);
            if shifts.is_empty() {
                self.note(Some(id), "no valid preferred shifts, preference ignored".to_string());
            } else {
                self.rules[e].push(PreferenceRule::ShiftPreference {
                    shifts,
                    strict: pref.preferred_shifts_strict,
                });
            }
        }

        for (kind, slots, hard) in [
            ("hard-blocked", &pref.hard_blocked_slots, true),
            ("medium-blocked", &pref.medium_blocked_slots, false),
        ] {
            if slots.len() > MAX_BLOCKED_SLOTS {
                self.note(
                    Some(id),
                    format!(
                        "{} {} slots given, only the first {} are used",
                        slots.len(),
                        kind,
                        MAX_BLOCKED_SLOTS
                    ),
                );
            }
            for slot in slots.iter().take(MAX_BLOCKED_SLOTS) {
                if let Some((day, shifts)) = self.resolve_slot(id, kind, slot, period) {
                    self.rules[e].push(if hard {
                        PreferenceRule::HardBlockedSlot { day, shifts }
                    } else {
                        PreferenceRule::MediumBlockedSlot { day, shifts }
                    });
                }
            }
        }

        if let Some(max) = pref.max_shifts_per_week {
            if (0..=7).contains(&max) {
                self.rules[e].push(PreferenceRule::WeeklyLimit(max as u32));
            } else {
                self.note(
                    Some(id),
                    format!("max shifts per week {} outside 0..=7, ignored", max),
                );
            }
        }
    }

    fn ingest_manual(&mut self, e: usize, constraint: &ManualConstraint, period: &SchedulingPeriod) {
        let id = constraint.employee_id.as_str();
        let shifts = if constraint.shift_types.is_empty() {
            ShiftType::ALL.to_vec()
        } else {
            self.parse_shifts(id, "manual constraint shift", &constraint.shift_types)
        };
        if shifts.is_empty() {
            self.note(Some(id), "manual constraint has no valid shifts, skipped".to_string());
            return;
        }

        for date in &constraint.dates {
            match period.day_index(*date) {
                Some(day) => self.rules[e].push(PreferenceRule::Manual {
                    day,
                    shifts: shifts.clone(),
                    hard: constraint.is_hard,
                }),
                None => self.note(
                    Some(id),
                    format!("manual constraint date {} outside the period, skipped", date),
                ),
            }
        }
    }

    fn resolve_slot(
        &mut self,
        id: &str,
        kind: &str,
        slot: &BlockedSlot,
        period: &SchedulingPeriod,
    ) -> Option<(usize, Vec<ShiftType>)> {
        let Ok(date) = NaiveDate::parse_from_str(slot.date.trim(), "%Y-%m-%d") else {
            self.note(Some(id), format!("{} slot has invalid date '{}'", kind, slot.date));
            return None;
        };
        let Some(day) = period.day_index(date) else {
            self.note(
                Some(id),
                format!("{} slot date {} outside the period, skipped", kind, date),
            );
            return None;
        };
        let shifts = self.parse_shifts(id, kind, &slot.shift_types);
        if shifts.is_empty() {
            self.note(Some(id), format!("{} slot on {} has no valid shifts", kind, date));
            return None;
        }
        Some((day, shifts))
    }

    fn parse_weekdays(&mut self, id: &str, what: &str, names: &[String]) -> Vec<Weekday> {
        let mut days = Vec::new();
        for name in names {
            match name.trim().parse::<Weekday>() {
                Ok(day) if !days.contains(&day) => days.push(day),
                Ok(_) => {}
                Err(_) => self.note(Some(id), format!("unrecognized {} '{}'", what, name)),
            }
        }
        days
    }

    /// Parses shift names; `all_day`/`heldag` expands to every shift type.
    fn parse_shifts(&mut self, id: &str, what: &str, names: &[String]) -> Vec<ShiftType> {
        let mut shifts = BTreeSet::new();
        for name in names {
            let lowered = name.trim().to_lowercase();
            if matches!(lowered.as_str(), "all_day" | "all-day" | "heldag") {
                shifts.extend(ShiftType::ALL);
                continue;
            }
            match lowered.parse::<ShiftType>() {
                Ok(shift) => {
                    shifts.insert(shift);
                }
                Err(_) => self.note(Some(id), format!("unrecognized {} '{}'", what, name)),
            }
        }
        shifts.into_iter().collect()
    }

    fn note(&mut self, employee_id: Option<&str>, message: String) {
        warn!(employee_id = employee_id.unwrap_or("-"), "{}", message);
        self.notes.push(ValidationNote {
            employee_id: employee_id.map(str::to_string),
            message,
        });
    }

    pub fn rules_for(&self, employee: usize) -> &[PreferenceRule] {
        self.rules.get(employee).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn notes(&self) -> &[ValidationNote] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<ValidationNote> {
        self.notes
    }

    /// First hard exclusion of `(employee, day, shift)`, preferences before manual rules.
    pub fn hard_exclusion(
        &self,
        employee: usize,
        day: &PlanningDay,
        shift: ShiftType,
    ) -> Option<Exclusion> {
        let rules = self.rules_for(employee);
        rules
            .iter()
            .filter(|r| !r.is_manual())
            .chain(rules.iter().filter(|r| r.is_manual()))
            .find_map(|r| r.excludes(day, shift))
    }

    /// Tightest weekly limit override of an employee.
    pub fn weekly_limit(&self, employee: usize) -> Option<u32> {
        self.rules_for(employee)
            .iter()
            .filter_map(|r| match r {
                PreferenceRule::WeeklyLimit(n) => Some(*n),
                _ => None,
            })
            .min()
    }

    /// Discouraged `(day, shift)` slots: medium blocks and soft manual rules, deduplicated.
    pub fn medium_slots(&self, employee: usize) -> BTreeSet<(usize, ShiftType)> {
        let mut slots = BTreeSet::new();
        for rule in self.rules_for(employee) {
            match rule {
                PreferenceRule::MediumBlockedSlot { day, shifts }
                | PreferenceRule::Manual {
                    day,
                    shifts,
                    hard: false,
                } => slots.extend(shifts.iter().map(|s| (*day, *s))),
                _ => {}
            }
        }
        slots
    }

    /// Soft availability list, if the employee has one.
    pub fn soft_days(&self, employee: usize) -> Option<&[Weekday]> {
        self.rules_for(employee).iter().find_map(|r| match r {
            PreferenceRule::DayPreference {
                days,
                strict: false,
            } => Some(days.as_slice()),
            _ => None,
        })
    }

    /// Soft shift preference list, if the employee has one.
    pub fn soft_shifts(&self, employee: usize) -> Option<&[ShiftType]> {
        self.rules_for(employee).iter().find_map(|r| match r {
            PreferenceRule::ShiftPreference {
                shifts,
                strict: false,
            } => Some(shifts.as_slice()),
            _ => None,
        })
    }
}
