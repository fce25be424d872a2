//! Weighted objective: coverage first, then fairness and preferences.
//!
//! The weights are separated by magnitude so each tier dominates the ones
//! below it on realistic roster sizes. Every auxiliary variable is declared
//! once and each term enters the objective exactly once.

use tracing::debug;

use crate::constraints::ModelContext;
use crate::domain::ShiftType;
use crate::model::{Comparator, LinearExpr, Sense, SolverOracle};
use crate::variables::DecisionVariables;

pub mod weights {
    pub const COVERAGE: f64 = 100.0;
    pub const TOTAL_FAIRNESS: f64 = 50.0;
    pub const WORK_PERCENTAGE_TARGET: f64 = 40.0;
    pub const MEDIUM_BLOCK: f64 = 30.0;
    pub const NON_PREFERRED_SHIFT: f64 = 18.0;
    pub const WEEKEND_FAIRNESS: f64 = 15.0;
    pub const NON_PREFERRED_DAY: f64 = 12.0;
    pub const SHIFT_TYPE_FAIRNESS: f64 = 8.0;
    pub const COST: f64 = 0.001;
}

/// Size of each objective tier, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectiveSummary {
    pub coverage_terms: usize,
    pub fairness_ranges: usize,
    pub target_deviations: usize,
    pub medium_indicators: usize,
    pub non_preferred_shift_terms: usize,
    pub non_preferred_day_terms: usize,
    pub cost_terms: usize,
}

/// Builds the objective and sets it on `model` (maximised).
pub fn set_objective<M: SolverOracle>(
    model: &mut M,
    vars: &DecisionVariables,
    ctx: &ModelContext<'_>,
) -> ObjectiveSummary {
    let mut summary = ObjectiveSummary::default();
    let mut objective = LinearExpr::new();
    let n_employees = ctx.employees.len();

    for (_, var) in vars.iter() {
        objective.add_term(var, weights::COVERAGE);
        summary.coverage_terms += 1;
    }

    let totals: Vec<LinearExpr> = (0..n_employees).map(|e| vars.employee_total(e)).collect();
    if let Some(range) = fairness_range(model, "total", &totals) {
        objective.add_scaled(&range, -weights::TOTAL_FAIRNESS);
        summary.fairness_ranges += 1;
    }

    if !ctx.config.optimize_for_cost {
        for (e, total) in totals.iter().enumerate() {
            let target = f64::from(ctx.period_cap_for(e));
            let deviation = model.declare_continuous(
                &format!("dev_{}", ctx.employees[e].id),
                Some(0.0),
                None,
            );
            // |total - target| <= deviation
            model.add_constraint(
                total.clone().term(deviation, -1.0),
                Comparator::LessEq,
                target,
            );
            model.add_constraint(
                total.clone().term(deviation, 1.0),
                Comparator::GreaterEq,
                target,
            );
            objective.add_term(deviation, -weights::WORK_PERCENTAGE_TARGET);
            summary.target_deviations += 1;
        }
    }

    for (e, employee) in ctx.employees.iter().enumerate() {
        for (day, shift) in ctx.rules.medium_slots(e) {
            let x = vars.get(e, day, shift);
            let y = model.declare_continuous(
                &format!("medium_{}_{}_{}", employee.id, day, shift),
                Some(0.0),
                Some(1.0),
            );
            model.add_constraint(
                LinearExpr::from(y).term(x, -1.0),
                Comparator::GreaterEq,
                0.0,
            );
            objective.add_term(y, -weights::MEDIUM_BLOCK);
            summary.medium_indicators += 1;
        }
    }

    for e in 0..n_employees {
        let Some(preferred) = ctx.rules.soft_shifts(e) else {
            continue;
        };
        for shift in ShiftType::ALL.into_iter().filter(|s| !preferred.contains(s)) {
            for d in 0..vars.n_days() {
                objective.add_term(vars.get(e, d, shift), -weights::NON_PREFERRED_SHIFT);
                summary.non_preferred_shift_terms += 1;
            }
        }
    }

    let weekend_days: Vec<usize> = ctx
        .period
        .days()
        .iter()
        .filter(|d| d.is_weekend())
        .map(|d| d.index)
        .collect();
    if !weekend_days.is_empty() {
        let weekends: Vec<LinearExpr> = (0..n_employees)
            .map(|e| vars.employee_days(e, weekend_days.iter().copied()))
            .collect();
        if let Some(range) = fairness_range(model, "weekend", &weekends) {
            objective.add_scaled(&range, -weights::WEEKEND_FAIRNESS);
            summary.fairness_ranges += 1;
        }
    }

    for e in 0..n_employees {
        let Some(available) = ctx.rules.soft_days(e) else {
            continue;
        };
        for day in ctx
            .period
            .days()
            .iter()
            .filter(|d| !available.contains(&d.weekday))
        {
            for shift in ShiftType::ALL {
                objective.add_term(vars.get(e, day.index, shift), -weights::NON_PREFERRED_DAY);
                summary.non_preferred_day_terms += 1;
            }
        }
    }

    for shift in ShiftType::ALL {
        let counts: Vec<LinearExpr> = (0..n_employees)
            .map(|e| LinearExpr::sum((0..vars.n_days()).map(|d| vars.get(e, d, shift))))
            .collect();
        if let Some(range) = fairness_range(model, shift.as_str(), &counts) {
            objective.add_scaled(&range, -weights::SHIFT_TYPE_FAIRNESS);
            summary.fairness_ranges += 1;
        }
    }

    if ctx.config.optimize_for_cost {
        for (key, var) in vars.iter() {
            let employee = &ctx.employees[key.employee];
            let cost = employee.hourly_rate * key.shift.window().duration_hours();
            objective.add_term(var, -weights::COST * cost);
            summary.cost_terms += 1;
        }
    }

    debug!(
        coverage_terms = summary.coverage_terms,
        fairness_ranges = summary.fairness_ranges,
        target_deviations = summary.target_deviations,
        medium_indicators = summary.medium_indicators,
        cost_terms = summary.cost_terms,
        "Objective built"
    );

    model.set_objective(objective, Sense::Maximize);
    summary
}

/// Declares `max`/`min` bound variables over the per-employee counts and
/// returns `max - min`. `None` with fewer than two employees.
fn fairness_range<M: SolverOracle>(
    model: &mut M,
    name: &str,
    counts: &[LinearExpr],
) -> Option<LinearExpr> {
    if counts.len() < 2 {
        return None;
    }
    let hi = model.declare_continuous(&format!("{}_max", name), Some(0.0), None);
    let lo = model.declare_continuous(&format!("{}_min", name), Some(0.0), None);
    for count in counts {
        model.add_constraint(count.clone().term(hi, -1.0), Comparator::LessEq, 0.0);
        model.add_constraint(count.clone().term(lo, -1.0), Comparator::GreaterEq, 0.0);
    }
    Some(LinearExpr::from(hi).term(lo, -1.0))
}
