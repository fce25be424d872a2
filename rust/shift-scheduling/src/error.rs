//! Error taxonomy for scheduling runs.
//!
//! Pre-solve checks fail fast with what was required versus what is possible.
//! Solver infeasibility is recovered by the relaxation ladder and only
//! surfaces here once every level has been tried.

use serde::Serialize;
use thiserror::Error;

use crate::model::SolveStatus;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Error raised by the employee store or the constraint service.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// What the controller was attempting when a run failed terminally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureContext {
    pub min_staff_per_shift: u32,
    pub max_staff_per_shift: u32,
    pub original_experience: u32,
    /// Experience requirement of the last attempt made.
    pub last_experience: u32,
    pub attempts: usize,
    pub status: SolveStatus,
}

impl std::fmt::Display for FailureContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "staff {}..={} per shift, experience {} (last tried {}), {} attempt(s), final status {}",
            self.min_staff_per_shift,
            self.max_staff_per_shift,
            self.original_experience,
            self.last_experience,
            self.attempts,
            self.status.as_str()
        )
    }
}

/// Errors returned by [`optimize`](crate::solver::optimize).
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("invalid period: {days} day(s), allowed range is 1..={max}")]
    InvalidPeriod { days: i64, max: u32 },

    #[error("no employees to schedule")]
    NoEmployees,

    #[error(
        "not enough staff: {required} person-shifts required but at most {available} possible \
         with {employees} employees over {weeks:.1} weeks"
    )]
    InsufficientStaffCapacity {
        required: u32,
        available: u32,
        employees: usize,
        weeks: f64,
    },

    #[error(
        "not enough experience: a shift requires {required} experience points but the whole \
         pool of {employees} employees only has {available}"
    )]
    InsufficientExperienceCapacity {
        required: u32,
        available: u32,
        employees: usize,
    },

    #[error("no feasible schedule found ({0})")]
    InfeasibleModel(FailureContext),

    #[error("time limit reached without a feasible schedule ({0})")]
    SolverTimeout(FailureContext),

    #[error("solver failed ({0})")]
    SolverFailed(FailureContext),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("optimization task failed: {0}")]
    TaskFailed(String),
}

impl SchedulingError {
    /// Returns the failure context for terminal solver failures.
    pub fn failure_context(&self) -> Option<&FailureContext> {
        match self {
            SchedulingError::InfeasibleModel(ctx)
            | SchedulingError::SolverTimeout(ctx)
            | SchedulingError::SolverFailed(ctx) => Some(ctx),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_is_actionable() {
        let err = SchedulingError::InsufficientStaffCapacity {
            required: 42,
            available: 30,
            employees: 3,
            weeks: 2.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("42 person-shifts required"));
        assert!(msg.contains("at most 30 possible"));
        assert!(msg.contains("2.0 weeks"));
    }

    #[test]
    fn test_failure_context_exposed() {
        let ctx = FailureContext {
            min_staff_per_shift: 2,
            max_staff_per_shift: 2,
            original_experience: 4,
            last_experience: 1,
            attempts: 4,
            status: SolveStatus::Infeasible,
        };
        let err = SchedulingError::InfeasibleModel(ctx.clone());
        assert_eq!(err.failure_context(), Some(&ctx));
        assert!(err.to_string().contains("last tried 1"));
        assert!(SchedulingError::NoEmployees.failure_context().is_none());
    }
}
