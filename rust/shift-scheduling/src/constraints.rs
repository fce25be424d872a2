//! Hard constraints of the shift scheduling model.
//!
//! Emitted in a fixed order:
//!
//! 1. **One shift per day** per employee
//! 2. **Weekly cap** over every 7-day window, scaled by work percentage
//! 3. **Period cap** over the whole horizon
//! 4. **Staffing** minimum and maximum per slot
//! 5. **Experience** minimum per staffed slot
//! 6. **Night qualification** by role
//! 7. **Employee exclusions** from preferences
//! 8. **Manual hard constraints**

use std::collections::HashSet;
use tracing::debug;

use crate::capacity::{period_cap, weekly_cap, weekly_windows};
use crate::config::SchedulingConfig;
use crate::domain::{Employee, ShiftType};
use crate::model::{Comparator, LinearExpr, SolverOracle, VarHandle};
use crate::period::{PlanningDay, SchedulingPeriod};
use crate::preferences::RuleBook;
use crate::variables::DecisionVariables;

/// Everything one model build reads. Rebuilt per ladder level only through
/// `experience_cap`.
#[derive(Debug, Clone, Copy)]
pub struct ModelContext<'a> {
    pub employees: &'a [Employee],
    pub period: &'a SchedulingPeriod,
    pub config: &'a SchedulingConfig,
    pub rules: &'a RuleBook,
    /// Upper bound on every slot's experience requirement at this ladder level.
    pub experience_cap: Option<u32>,
}

/// Staffing requirement of one (day, shift) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBounds {
    pub min_staff: u32,
    pub max_staff: u32,
    pub min_experience: u32,
}

impl<'a> ModelContext<'a> {
    pub fn slot_bounds(&self, day: &PlanningDay, shift: ShiftType) -> SlotBounds {
        let staffing = self.config.staffing_for(shift);
        let min_experience = match self.experience_cap {
            Some(cap) => staffing.min_experience.min(cap),
            None => staffing.min_experience,
        };
        SlotBounds {
            min_staff: if day.coverage_required {
                staffing.min_staff
            } else {
                0
            },
            max_staff: staffing.max_staff,
            min_experience,
        }
    }

    /// Whether the role gate keeps `employee` off night shifts.
    pub fn night_disqualified(&self, employee: usize) -> bool {
        !self
            .config
            .qualification
            .allows_night(self.employees[employee].role.as_deref())
    }

    /// Effective weekly cap of `employee` for a window of `window_len` days.
    pub fn weekly_cap_for(&self, employee: usize, window_len: usize) -> u32 {
        let legal = weekly_cap(self.employees[employee].work_percentage, window_len);
        match self.rules.weekly_limit(employee) {
            Some(limit) => legal.min(limit.min(window_len as u32)),
            None => legal,
        }
    }

    pub fn period_cap_for(&self, employee: usize) -> u32 {
        period_cap(self.employees[employee].work_percentage, self.period.len())
    }
}

/// Number of constraints emitted per step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSummary {
    pub one_shift_per_day: usize,
    pub weekly_caps: usize,
    pub period_caps: usize,
    pub staffing: usize,
    pub experience: usize,
    pub qualification: usize,
    pub exclusions: usize,
    pub manual: usize,
}

impl ConstraintSummary {
    pub fn total(&self) -> usize {
        self.one_shift_per_day
            + self.weekly_caps
            + self.period_caps
            + self.staffing
            + self.experience
            + self.qualification
            + self.exclusions
            + self.manual
    }
}

/// Adds all hard constraints to `model`.
pub fn add_hard_constraints<M: SolverOracle>(
    model: &mut M,
    vars: &DecisionVariables,
    ctx: &ModelContext<'_>,
) -> ConstraintSummary {
    let mut summary = ConstraintSummary::default();
    let mut forced = ForcedZeros::default();
    let n_days = ctx.period.len();
    let partial = ctx.config.allow_partial_coverage;

    for e in 0..ctx.employees.len() {
        for d in 0..n_days {
            model.add_constraint(vars.employee_day(e, d), Comparator::LessEq, 1.0);
            summary.one_shift_per_day += 1;
        }
    }

    let windows = weekly_windows(n_days);
    for e in 0..ctx.employees.len() {
        if windows.is_empty() {
            // Short periods only honour an explicit weekly override.
            if let Some(limit) = ctx.rules.weekly_limit(e) {
                model.add_constraint(
                    vars.employee_total(e),
                    Comparator::LessEq,
                    f64::from(limit.min(n_days as u32)),
                );
                summary.weekly_caps += 1;
            }
            continue;
        }
        for window in &windows {
            let cap = ctx.weekly_cap_for(e, window.len());
            model.add_constraint(
                vars.employee_days(e, window.clone()),
                Comparator::LessEq,
                f64::from(cap),
            );
            summary.weekly_caps += 1;
        }
    }

    for e in 0..ctx.employees.len() {
        model.add_constraint(
            vars.employee_total(e),
            Comparator::LessEq,
            f64::from(ctx.period_cap_for(e)),
        );
        summary.period_caps += 1;
    }

    for day in ctx.period.days() {
        for shift in ShiftType::ALL {
            let bounds = ctx.slot_bounds(day, shift);
            let staffed = vars.slot(day.index, shift);
            if bounds.min_staff > 0 && !partial {
                model.add_constraint(
                    staffed.clone(),
                    Comparator::GreaterEq,
                    f64::from(bounds.min_staff),
                );
                summary.staffing += 1;
            }
            model.add_constraint(staffed, Comparator::LessEq, f64::from(bounds.max_staff));
            summary.staffing += 1;
        }
    }

    for day in ctx.period.days() {
        for shift in ShiftType::ALL {
            let bounds = ctx.slot_bounds(day, shift);
            if bounds.min_staff == 0 || bounds.min_experience == 0 || partial {
                continue;
            }
            let mut experience = LinearExpr::new();
            for (e, employee) in ctx.employees.iter().enumerate() {
                experience.add_term(
                    vars.get(e, day.index, shift),
                    f64::from(employee.experience_level),
                );
            }
            model.add_constraint(
                experience,
                Comparator::GreaterEq,
                f64::from(bounds.min_experience),
            );
            summary.experience += 1;
        }
    }

    if ctx.config.qualification.require_night_qualification {
        for e in (0..ctx.employees.len()).filter(|e| ctx.night_disqualified(*e)) {
            for d in 0..n_days {
                summary.qualification += forced.pin(model, vars.get(e, d, ShiftType::Night));
            }
        }
    }

    for manual_pass in [false, true] {
        for e in 0..ctx.employees.len() {
            for rule in ctx
                .rules
                .rules_for(e)
                .iter()
                .filter(|r| r.is_manual() == manual_pass)
            {
                for day in ctx.period.days() {
                    for shift in ShiftType::ALL {
                        if rule.excludes(day, shift).is_some() {
                            let added = forced.pin(model, vars.get(e, day.index, shift));
                            if manual_pass {
                                summary.manual += added;
                            } else {
                                summary.exclusions += added;
                            }
                        }
                    }
                }
            }
        }
    }

    debug!(
        one_shift_per_day = summary.one_shift_per_day,
        weekly_caps = summary.weekly_caps,
        period_caps = summary.period_caps,
        staffing = summary.staffing,
        experience = summary.experience,
        qualification = summary.qualification,
        exclusions = summary.exclusions,
        manual = summary.manual,
        "Hard constraints added"
    );

    summary
}

/// Variables already pinned to zero, so overlapping rules add one row each.
#[derive(Default)]
struct ForcedZeros(HashSet<VarHandle>);

impl ForcedZeros {
    fn pin<M: SolverOracle>(&mut self, model: &mut M, var: VarHandle) -> usize {
        if self.0.insert(var) {
            model.add_constraint(LinearExpr::from(var), Comparator::Equal, 0.0);
            1
        } else {
            0
        }
    }
}
