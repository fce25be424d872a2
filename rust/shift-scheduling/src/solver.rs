//! Optimization entry point and relaxation ladder.
//!
//! Every attempt builds a fresh model from scratch: variables, hard
//! constraints and objective. When the engine reports infeasibility the
//! experience requirement is lowered one level and the model is rebuilt,
//! down to 1. Each model is seeded with a first-fit schedule so that a
//! time limit still yields an incumbent.

use chrono::NaiveDate;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::capacity::CapacityReport;
use crate::config::SchedulingConfig;
use crate::constraints::{add_hard_constraints, ModelContext};
use crate::construction::first_fit;
use crate::domain::{Employee, ScheduleAssignment};
use crate::error::{FailureContext, SchedulingError};
use crate::model::{SolveLimits, SolveStatus, SolverBackend, SolverOracle};
use crate::objective::set_objective;
use crate::period::SchedulingPeriod;
use crate::preferences::{EmployeePreference, ManualConstraint, RuleBook, ValidationNote};
use crate::solution::{
    extract, CoverageStatistics, EmployeeBreakdown, FairnessStatistics, UncoveredSlot,
};
use crate::variables::DecisionVariables;

/// Inputs of one optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub employees: Vec<Employee>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub config: SchedulingConfig,
    pub preferences: Vec<EmployeePreference>,
    pub manual_constraints: Vec<ManualConstraint>,
}

impl OptimizationRequest {
    pub fn new(employees: Vec<Employee>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            employees,
            start_date,
            end_date,
            config: SchedulingConfig::default(),
            preferences: Vec::new(),
            manual_constraints: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: SchedulingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_preferences(mut self, preferences: Vec<EmployeePreference>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_manual_constraints(mut self, constraints: Vec<ManualConstraint>) -> Self {
        self.manual_constraints = constraints;
        self
    }
}

/// Ladder position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationState {
    Initial,
    /// Experience requirement lowered to this level.
    Relaxed(u32),
}

impl RelaxationState {
    /// Every state tried for an original requirement, in order.
    ///
    /// ```
    /// use shift_scheduling::solver::RelaxationState;
    ///
    /// assert_eq!(
    ///     RelaxationState::ladder(3),
    ///     vec![RelaxationState::Initial, RelaxationState::Relaxed(2), RelaxationState::Relaxed(1)]
    /// );
    /// assert_eq!(RelaxationState::ladder(1), vec![RelaxationState::Initial]);
    /// ```
    pub fn ladder(original_experience: u32) -> Vec<Self> {
        std::iter::once(RelaxationState::Initial)
            .chain((1..original_experience).rev().map(RelaxationState::Relaxed))
            .collect()
    }

    pub fn experience_cap(self) -> Option<u32> {
        match self {
            RelaxationState::Initial => None,
            RelaxationState::Relaxed(k) => Some(k),
        }
    }

    fn time_limit(self, config: &SchedulingConfig) -> Duration {
        match self {
            RelaxationState::Initial => config.termination.initial_time_limit(),
            RelaxationState::Relaxed(_) => config.termination.relaxation_time_limit(),
        }
    }
}

/// Provenance of a schedule found after relaxing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaxationNote {
    pub original_experience: u32,
    pub used_experience: u32,
    pub message: String,
}

/// One solve call of the ladder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    /// `None` for the initial attempt.
    pub experience_cap: Option<u32>,
    pub status: SolveStatus,
    pub duration_ms: u64,
}

/// Successful run output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub schedule: Vec<ScheduleAssignment>,
    pub coverage: CoverageStatistics,
    pub fairness: FairnessStatistics,
    pub employee_stats: Vec<EmployeeBreakdown>,
    pub uncovered: Vec<UncoveredSlot>,
    pub objective_value: Option<f64>,
    pub status: SolveStatus,
    pub relaxation: Option<RelaxationNote>,
    pub attempts: Vec<AttemptRecord>,
    pub validation_notes: Vec<ValidationNote>,
    pub capacity: CapacityReport,
    pub random_seed: Option<u64>,
    pub backend: String,
}

/// Builds, solves and extracts a schedule, relaxing the experience
/// requirement on infeasibility.
///
/// # Errors
///
/// - [`SchedulingError::Config`] for an inconsistent configuration
/// - [`SchedulingError::InvalidPeriod`] before anything is built
/// - [`SchedulingError::NoEmployees`] for an empty roster
/// - capacity errors from the pre-solve checks unless partial coverage is allowed
/// - [`SchedulingError::InfeasibleModel`], [`SchedulingError::SolverTimeout`]
///   or [`SchedulingError::SolverFailed`] once the ladder ends without a schedule
///
/// ```
/// use chrono::NaiveDate;
/// use shift_scheduling::backend::GoodLpBackend;
/// use shift_scheduling::config::SchedulingConfig;
/// use shift_scheduling::domain::Employee;
/// use shift_scheduling::solver::{optimize, OptimizationRequest};
///
/// let day = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
/// let employees = (1..=3).map(|i| Employee::new(format!("e{i}"), format!("Employee {i}"))).collect();
/// let request = OptimizationRequest::new(employees, day, day)
///     .with_config(SchedulingConfig::default().with_random_seed(42));
///
/// let result = optimize(&GoodLpBackend::new(), &request).unwrap();
/// assert_eq!(result.schedule.len(), 3);
/// assert_eq!(result.coverage.coverage_percentage, 100.0);
/// ```
pub fn optimize<B: SolverBackend>(
    backend: &B,
    request: &OptimizationRequest,
) -> Result<ScheduleResult, SchedulingError> {
    let config = &request.config;
    config.validate()?;

    let period = SchedulingPeriod::new(
        request.start_date,
        request.end_date,
        config.include_weekends,
        config.max_period_days,
    )?;
    let employees = &request.employees;
    if employees.is_empty() {
        return Err(SchedulingError::NoEmployees);
    }

    info!(
        employees = employees.len(),
        days = period.len(),
        weeks = period.total_weeks(),
        backend = backend.name(),
        "Starting schedule optimization"
    );

    let rules = RuleBook::compile(
        employees,
        &period,
        &request.preferences,
        &request.manual_constraints,
    );

    let capacity = CapacityReport::assess(employees, &period, config);
    capacity.check(employees.len(), &period, config.allow_partial_coverage)?;
    if capacity.required_person_shifts > capacity.available_person_shifts {
        warn!(
            required = capacity.required_person_shifts,
            available = capacity.available_person_shifts,
            expected_coverage = capacity.expected_coverage_percentage,
            "Staff capacity short, proceeding with partial coverage"
        );
    }

    let original_experience = config.max_experience_requirement();
    let mut attempts = Vec::new();
    let mut last_status = SolveStatus::Other;
    let mut last_experience = original_experience;

    #[cfg(feature = "console")]
    crate::console::print_problem(employees.len(), period.len(), original_experience);

    for state in RelaxationState::ladder(original_experience) {
        let ctx = ModelContext {
            employees,
            period: &period,
            config,
            rules: &rules,
            experience_cap: state.experience_cap(),
        };
        let used_experience = state.experience_cap().unwrap_or(original_experience);
        last_experience = used_experience;

        let started = Instant::now();
        let mut model = backend.new_model(&format!("shift_schedule_exp{}", used_experience));
        let vars = DecisionVariables::declare(&mut model, employees, &period);
        let constraints = add_hard_constraints(&mut model, &vars, &ctx);
        set_objective(&mut model, &vars, &ctx);
        let initial = first_fit(&ctx);
        for (var, value) in initial.hints(&vars) {
            model.hint(var, value);
        }

        let limits = SolveLimits {
            time_limit: state.time_limit(config),
            random_seed: config.random_seed,
        };
        info!(
            experience = used_experience,
            variables = vars.len(),
            constraints = constraints.total(),
            first_fit_assignments = initial.assignments.len(),
            first_fit_short_slots = initial.short_slots,
            time_limit_secs = limits.time_limit.as_secs(),
            "Solving"
        );
        let outcome = model.solve(&limits);
        let elapsed = started.elapsed();
        last_status = outcome.status;

        attempts.push(AttemptRecord {
            experience_cap: state.experience_cap(),
            status: outcome.status,
            duration_ms: elapsed.as_millis() as u64,
        });

        #[cfg(feature = "console")]
        crate::console::print_attempt(attempts.len(), used_experience, outcome.status, elapsed);

        if outcome.status.is_feasible() {
            let extracted = extract(&outcome, &vars, &ctx);
            let relaxation = match state {
                RelaxationState::Initial => None,
                RelaxationState::Relaxed(k) => Some(RelaxationNote {
                    original_experience,
                    used_experience: k,
                    message: format!(
                        "experience requirement relaxed from {} to {}",
                        original_experience, k
                    ),
                }),
            };

            info!(
                status = %outcome.status,
                experience = used_experience,
                assignments = extracted.schedule.len(),
                coverage = extracted.coverage.coverage_percentage,
                attempts = attempts.len(),
                "Schedule found"
            );

            return Ok(ScheduleResult {
                schedule: extracted.schedule,
                coverage: extracted.coverage,
                fairness: extracted.fairness,
                employee_stats: extracted.employee_stats,
                uncovered: extracted.uncovered,
                objective_value: outcome.objective_value,
                status: outcome.status,
                relaxation,
                attempts,
                validation_notes: rules.into_notes(),
                capacity,
                random_seed: config.random_seed,
                backend: backend.name().to_string(),
            });
        }

        let failure = || FailureContext {
            min_staff_per_shift: config.min_staff_per_shift,
            max_staff_per_shift: config
                .max_staff_per_shift
                .unwrap_or(config.min_staff_per_shift),
            original_experience,
            last_experience: used_experience,
            attempts: attempts.len(),
            status: outcome.status,
        };
        match outcome.status {
            SolveStatus::TimeLimitNoIncumbent => {
                warn!(experience = used_experience, "Time limit reached without a schedule");
                return Err(SchedulingError::SolverTimeout(failure()));
            }
            status if status.is_infeasible() => {
                warn!(experience = used_experience, status = %status, "Model infeasible");
            }
            status => {
                warn!(experience = used_experience, status = %status, "Solver failed");
                return Err(SchedulingError::SolverFailed(failure()));
            }
        }
    }

    Err(SchedulingError::InfeasibleModel(FailureContext {
        min_staff_per_shift: config.min_staff_per_shift,
        max_staff_per_shift: config
            .max_staff_per_shift
            .unwrap_or(config.min_staff_per_shift),
        original_experience,
        last_experience,
        attempts: attempts.len(),
        status: last_status,
    }))
}
