//! First-fit construction of a starting schedule.
//!
//! Walks the slots in calendar order and staffs each one from the employees
//! that can still legally take it. The result is handed to the engine as its
//! first incumbent, so a run cut short by the time limit still returns a
//! schedule. Slots that cannot be filled are left short.

use std::collections::HashSet;

use crate::capacity::weekly_windows;
use crate::constraints::ModelContext;
use crate::domain::ShiftType;
use crate::model::VarHandle;
use crate::period::PlanningDay;
use crate::variables::DecisionVariables;

/// Assignments picked by [`first_fit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialSchedule {
    /// `(employee, day, shift)` triples.
    pub assignments: Vec<(usize, usize, ShiftType)>,
    /// Slots left under their minimum staff or experience.
    pub short_slots: usize,
}

impl InitialSchedule {
    /// Value of every assignment variable: 1 when picked, 0 otherwise.
    pub fn hints(&self, vars: &DecisionVariables) -> Vec<(VarHandle, f64)> {
        let picked: HashSet<VarHandle> = self
            .assignments
            .iter()
            .map(|&(e, d, shift)| vars.get(e, d, shift))
            .collect();
        vars.iter()
            .map(|(_, var)| (var, if picked.contains(&var) { 1.0 } else { 0.0 }))
            .collect()
    }
}

/// Per-employee bookkeeping while the schedule is built.
struct Ledger {
    works: Vec<Vec<bool>>,
    load: Vec<u32>,
}

impl Ledger {
    fn window_load(&self, employee: usize, window: &std::ops::Range<usize>) -> u32 {
        self.works[employee][window.clone()]
            .iter()
            .filter(|w| **w)
            .count() as u32
    }
}

/// Builds a schedule that satisfies every hard rule except, where staff runs
/// out, the slot minimums.
pub fn first_fit(ctx: &ModelContext<'_>) -> InitialSchedule {
    let n_employees = ctx.employees.len();
    let n_days = ctx.period.len();
    let windows = weekly_windows(n_days);
    let mut ledger = Ledger {
        works: vec![vec![false; n_days]; n_employees],
        load: vec![0; n_employees],
    };
    let mut schedule = InitialSchedule::default();

    for day in ctx.period.days() {
        for shift in ShiftType::ALL {
            let bounds = ctx.slot_bounds(day, shift);
            let target = bounds.min_staff.min(bounds.max_staff) as usize;
            if target == 0 {
                continue;
            }

            let mut candidates: Vec<usize> = (0..n_employees)
                .filter(|&e| can_take(ctx, &ledger, &windows, e, day, shift))
                .collect();
            // Most remaining capacity first keeps later days staffable.
            candidates.sort_by_key(|&e| {
                (
                    std::cmp::Reverse(ctx.period_cap_for(e).saturating_sub(ledger.load[e])),
                    std::cmp::Reverse(ctx.employees[e].experience_level),
                    e,
                )
            });

            let experience_of = |picked: &[usize]| -> u32 {
                picked
                    .iter()
                    .map(|&e| ctx.employees[e].experience_level)
                    .sum()
            };
            let mut picked: Vec<usize> = candidates.iter().copied().take(target).collect();
            if experience_of(&picked) < bounds.min_experience {
                candidates.sort_by_key(|&e| (std::cmp::Reverse(ctx.employees[e].experience_level), e));
                picked = candidates.iter().copied().take(target).collect();
                for &e in candidates.iter().skip(target) {
                    if experience_of(&picked) >= bounds.min_experience
                        || picked.len() >= bounds.max_staff as usize
                    {
                        break;
                    }
                    picked.push(e);
                }
            }

            if picked.len() < target || experience_of(&picked) < bounds.min_experience {
                schedule.short_slots += 1;
            }
            for e in picked {
                ledger.works[e][day.index] = true;
                ledger.load[e] += 1;
                schedule.assignments.push((e, day.index, shift));
            }
        }
    }

    schedule
}

fn can_take(
    ctx: &ModelContext<'_>,
    ledger: &Ledger,
    windows: &[std::ops::Range<usize>],
    employee: usize,
    day: &PlanningDay,
    shift: ShiftType,
) -> bool {
    if ledger.works[employee][day.index] || ledger.load[employee] >= ctx.period_cap_for(employee) {
        return false;
    }
    if shift == ShiftType::Night
        && ctx.config.qualification.require_night_qualification
        && ctx.night_disqualified(employee)
    {
        return false;
    }
    if ctx.rules.hard_exclusion(employee, day, shift).is_some() {
        return false;
    }
    if windows.is_empty() {
        return match ctx.rules.weekly_limit(employee) {
            Some(limit) => ledger.load[employee] < limit.min(ctx.period.len() as u32),
            None => true,
        };
    }
    windows
        .iter()
        .filter(|w| w.contains(&day.index))
        .all(|w| ledger.window_load(employee, w) < ctx.weekly_cap_for(employee, w.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulingConfig;
    use crate::domain::Employee;
    use crate::period::SchedulingPeriod;
    use crate::preferences::{EmployeePreference, RuleBook};
    use chrono::NaiveDate;

    fn period(days: i64) -> SchedulingPeriod {
        let start = NaiveDate::from_ymd_opt(2024, 8, 5).unwrap();
        SchedulingPeriod::new(start, start + chrono::Duration::days(days - 1), true, 92).unwrap()
    }

    fn roster(n: usize) -> Vec<Employee> {
        (0..n)
            .map(|i| {
                Employee::new(format!("e{i}"), format!("Employee {i}"))
                    .with_experience(1 + (i % 3) as u32)
            })
            .collect()
    }

    #[test]
    fn test_first_fit_staffs_every_slot() {
        let employees = roster(5);
        let period = period(7);
        let config = SchedulingConfig::default().with_min_staff(1);
        let rules = RuleBook::empty(employees.len());
        let ctx = ModelContext {
            employees: &employees,
            period: &period,
            config: &config,
            rules: &rules,
            experience_cap: None,
        };

        let schedule = first_fit(&ctx);

        assert_eq!(schedule.short_slots, 0);
        assert_eq!(schedule.assignments.len(), 21);
        let per_day: HashSet<(usize, usize)> =
            schedule.assignments.iter().map(|&(e, d, _)| (e, d)).collect();
        assert_eq!(per_day.len(), schedule.assignments.len(), "one shift per day");
        for e in 0..employees.len() {
            let load = schedule.assignments.iter().filter(|a| a.0 == e).count() as u32;
            assert!(load <= ctx.period_cap_for(e));
        }
    }

    #[test]
    fn test_first_fit_respects_hard_block() {
        let employees = roster(2);
        let period = period(1);
        let config = SchedulingConfig::default().with_min_staff(1);
        let prefs = vec![EmployeePreference::new("e0").with_hard_block("2024-08-05", &["all_day"])];
        let rules = RuleBook::compile(&employees, &period, &prefs, &[]);
        let ctx = ModelContext {
            employees: &employees,
            period: &period,
            config: &config,
            rules: &rules,
            experience_cap: None,
        };

        let schedule = first_fit(&ctx);

        assert!(schedule.assignments.iter().all(|a| a.0 != 0));
        assert_eq!(schedule.assignments.len(), 1);
        assert_eq!(schedule.short_slots, 2);
    }

    #[test]
    fn test_first_fit_prefers_experience_when_short() {
        let employees = vec![
            Employee::new("junior", "Junior").with_experience(1),
            Employee::new("senior", "Senior").with_experience(4),
        ];
        let period = period(1);
        let config = SchedulingConfig::default()
            .with_min_staff(1)
            .with_min_experience(3);
        let rules = RuleBook::empty(employees.len());
        let ctx = ModelContext {
            employees: &employees,
            period: &period,
            config: &config,
            rules: &rules,
            experience_cap: None,
        };

        let schedule = first_fit(&ctx);

        assert_eq!(schedule.assignments[0], (1, 0, ShiftType::Day));
    }
}
