//! Narrow contract between the model builders and a MIP engine.
//!
//! Builders only declare variables, add linear constraints, set one objective
//! and call [`SolverOracle::solve`]. Engines plug in through
//! [`SolverBackend`], which hands out a fresh, isolated model per attempt.

use serde::Serialize;
use std::time::Duration;

/// Opaque handle of a declared variable, dense from zero in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarHandle(usize);

impl VarHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Linear expression `Σ coef × var + constant`.
///
/// ```
/// use shift_scheduling::model::{LinearExpr, VarHandle};
///
/// let x = VarHandle::new(0);
/// let y = VarHandle::new(1);
/// let expr = LinearExpr::new().term(x, 2.0).term(y, -1.0).plus(3.0);
///
/// assert_eq!(expr.eval(&[1.0, 4.0]), 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarHandle, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the given variables, each with coefficient 1.
    pub fn sum<I: IntoIterator<Item = VarHandle>>(vars: I) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn term(mut self, var: VarHandle, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn plus(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    pub fn add_term(&mut self, var: VarHandle, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    /// Adds `scale × other` to this expression.
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) {
        for &(var, coef) in &other.terms {
            self.add_term(var, coef * scale);
        }
        self.constant += other.constant * scale;
    }

    pub fn terms(&self) -> &[(VarHandle, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of `var`, summing repeated terms.
    pub fn coefficient(&self, var: VarHandle) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    /// Evaluates the expression; handles past `values` count as 0.
    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarHandle> for LinearExpr {
    fn from(var: VarHandle) -> Self {
        Self::new().term(var, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    LessEq,
    GreaterEq,
    Equal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

/// Limits of one solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveLimits {
    pub time_limit: Duration,
    pub random_seed: Option<u64>,
}

/// Terminal status reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Suboptimal,
    Infeasible,
    InfeasibleOrUnbounded,
    TimeLimitWithIncumbent,
    TimeLimitNoIncumbent,
    Other,
}

impl SolveStatus {
    /// Whether the outcome carries an acceptable assignment.
    pub fn is_feasible(self) -> bool {
        matches!(
            self,
            SolveStatus::Optimal | SolveStatus::Suboptimal | SolveStatus::TimeLimitWithIncumbent
        )
    }

    /// Whether relaxing the model could help.
    pub fn is_infeasible(self) -> bool {
        matches!(
            self,
            SolveStatus::Infeasible | SolveStatus::InfeasibleOrUnbounded
        )
    }

    /// ```
    /// use shift_scheduling::model::SolveStatus;
    ///
    /// assert_eq!(SolveStatus::TimeLimitWithIncumbent.as_str(), "TIME_LIMIT_WITH_INCUMBENT");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Suboptimal => "SUBOPTIMAL",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::InfeasibleOrUnbounded => "INFEASIBLE_OR_UNBOUNDED",
            SolveStatus::TimeLimitWithIncumbent => "TIME_LIMIT_WITH_INCUMBENT",
            SolveStatus::TimeLimitNoIncumbent => "TIME_LIMIT_NO_INCUMBENT",
            SolveStatus::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one solve call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    /// Solved values indexed by [`VarHandle::index`]; empty without incumbent.
    pub values: Vec<f64>,
}

impl SolveOutcome {
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            objective_value: None,
            values: Vec::new(),
        }
    }

    pub fn value_of(&self, var: VarHandle) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }
}

/// One model under construction.
pub trait SolverOracle {
    fn declare_binary(&mut self, name: &str) -> VarHandle;

    /// Declares a continuous variable; `None` bounds are unbounded.
    fn declare_continuous(&mut self, name: &str, lower: Option<f64>, upper: Option<f64>)
        -> VarHandle;

    fn add_constraint(&mut self, expr: LinearExpr, cmp: Comparator, rhs: f64);

    fn set_objective(&mut self, expr: LinearExpr, sense: Sense);

    /// Suggests a starting value for `var`. Engines drop hints that do not
    /// form a feasible assignment.
    fn hint(&mut self, var: VarHandle, value: f64);

    /// Consumes the model and runs the engine.
    fn solve(self, limits: &SolveLimits) -> SolveOutcome
    where
        Self: Sized;
}

/// Factory of fresh models. Shared read-only between concurrent runs.
pub trait SolverBackend: Send + Sync {
    type Model: SolverOracle;

    fn name(&self) -> &'static str;

    fn new_model(&self, name: &str) -> Self::Model;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Backend that records what the builders emit and replays statuses.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum VarKind {
        Binary,
        Continuous(Option<f64>, Option<f64>),
    }

    #[derive(Debug, Clone, Default)]
    pub struct RecordedModel {
        pub name: String,
        pub vars: Vec<(String, VarKind)>,
        pub constraints: Vec<(LinearExpr, Comparator, f64)>,
        pub objective: Option<(LinearExpr, Sense)>,
        pub hints: Vec<(VarHandle, f64)>,
        pub limits: Option<SolveLimits>,
    }

    impl RecordedModel {
        pub fn handle(&self, name: &str) -> Option<VarHandle> {
            self.vars
                .iter()
                .position(|(n, _)| n == name)
                .map(VarHandle::new)
        }

        pub fn binary_count(&self) -> usize {
            self.vars
                .iter()
                .filter(|(_, k)| *k == VarKind::Binary)
                .count()
        }

        /// Constraints mentioning `var`.
        pub fn constraints_on(&self, var: VarHandle) -> Vec<&(LinearExpr, Comparator, f64)> {
            self.constraints
                .iter()
                .filter(|(e, _, _)| e.coefficient(var) != 0.0)
                .collect()
        }

        /// True when some constraint pins `var` to zero on its own.
        pub fn is_forced_zero(&self, var: VarHandle) -> bool {
            self.constraints.iter().any(|(e, cmp, rhs)| {
                e.terms().len() == 1
                    && e.terms()[0].0 == var
                    && matches!(cmp, Comparator::Equal | Comparator::LessEq)
                    && *rhs == 0.0
            })
        }
    }

    /// Replays queued statuses; every solve reports zero for all variables.
    #[derive(Clone, Default)]
    pub struct ScriptedBackend {
        statuses: Arc<Mutex<VecDeque<SolveStatus>>>,
        models: Arc<Mutex<Vec<RecordedModel>>>,
    }

    impl ScriptedBackend {
        pub fn new(statuses: impl IntoIterator<Item = SolveStatus>) -> Self {
            Self {
                statuses: Arc::new(Mutex::new(statuses.into_iter().collect())),
                models: Arc::default(),
            }
        }

        pub fn models(&self) -> Vec<RecordedModel> {
            self.models.lock().clone()
        }
    }

    pub struct RecordingModel {
        record: RecordedModel,
        statuses: Arc<Mutex<VecDeque<SolveStatus>>>,
        models: Arc<Mutex<Vec<RecordedModel>>>,
    }

    impl RecordingModel {
        pub fn record(&self) -> &RecordedModel {
            &self.record
        }
    }

    impl SolverBackend for ScriptedBackend {
        type Model = RecordingModel;

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn new_model(&self, name: &str) -> RecordingModel {
            RecordingModel {
                record: RecordedModel {
                    name: name.to_string(),
                    ..Default::default()
                },
                statuses: self.statuses.clone(),
                models: self.models.clone(),
            }
        }
    }

    impl SolverOracle for RecordingModel {
        fn declare_binary(&mut self, name: &str) -> VarHandle {
            self.record.vars.push((name.to_string(), VarKind::Binary));
            VarHandle::new(self.record.vars.len() - 1)
        }

        fn declare_continuous(
            &mut self,
            name: &str,
            lower: Option<f64>,
            upper: Option<f64>,
        ) -> VarHandle {
            self.record
                .vars
                .push((name.to_string(), VarKind::Continuous(lower, upper)));
            VarHandle::new(self.record.vars.len() - 1)
        }

        fn add_constraint(&mut self, expr: LinearExpr, cmp: Comparator, rhs: f64) {
            self.record.constraints.push((expr, cmp, rhs));
        }

        fn set_objective(&mut self, expr: LinearExpr, sense: Sense) {
            self.record.objective = Some((expr, sense));
        }

        fn hint(&mut self, var: VarHandle, value: f64) {
            self.record.hints.push((var, value));
        }

        fn solve(mut self, limits: &SolveLimits) -> SolveOutcome {
            self.record.limits = Some(*limits);
            let status = self.statuses.lock().pop_front().unwrap_or(SolveStatus::Optimal);
            let n = self.record.vars.len();
            self.models.lock().push(self.record);
            if status.is_feasible() {
                SolveOutcome {
                    status,
                    objective_value: Some(0.0),
                    values: vec![0.0; n],
                }
            } else {
                SolveOutcome::without_solution(status)
            }
        }
    }
}
