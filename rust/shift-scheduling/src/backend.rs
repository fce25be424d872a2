//! `good_lp` implementation of the solver oracle.
//!
//! Uses the pure-Rust `microlp` engine behind `good_lp::default_solver`.
//! The engine honours the time limit and starts from the hinted assignment.
//! It has no seed parameter, so equal models always give equal results.

use good_lp::solvers::{SolutionStatus, WithInitialSolution, WithTimeLimit};
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};
use tracing::debug;

use crate::model::{
    Comparator, LinearExpr, Sense, SolveLimits, SolveOutcome, SolveStatus, SolverBackend,
    SolverOracle, VarHandle,
};

/// Backend handing out `good_lp` models.
///
/// ```
/// use shift_scheduling::backend::GoodLpBackend;
/// use shift_scheduling::model::{Comparator, LinearExpr, Sense, SolveLimits, SolverBackend, SolverOracle};
/// use std::time::Duration;
///
/// let backend = GoodLpBackend::new();
/// let mut model = backend.new_model("doc");
/// let x = model.declare_binary("x");
/// let y = model.declare_binary("y");
/// model.add_constraint(LinearExpr::sum([x, y]), Comparator::LessEq, 1.0);
/// model.set_objective(LinearExpr::new().term(x, 1.0).term(y, 2.0), Sense::Maximize);
///
/// let outcome = model.solve(&SolveLimits { time_limit: Duration::from_secs(5), random_seed: None });
/// assert!(outcome.status.is_feasible());
/// assert!(outcome.value_of(y) > 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpBackend;

impl GoodLpBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for GoodLpBackend {
    type Model = GoodLpModel;

    fn name(&self) -> &'static str {
        "good_lp/microlp"
    }

    fn new_model(&self, name: &str) -> GoodLpModel {
        GoodLpModel {
            name: name.to_string(),
            vars: ProblemVariables::new(),
            handles: Vec::new(),
            constraints: Vec::new(),
            objective: (LinearExpr::new(), Sense::Maximize),
            hints: Vec::new(),
        }
    }
}

/// Model under construction. Constraints are kept as [`LinearExpr`] until
/// `solve` turns the problem into a `good_lp` model.
pub struct GoodLpModel {
    name: String,
    vars: ProblemVariables,
    handles: Vec<Variable>,
    constraints: Vec<(LinearExpr, Comparator, f64)>,
    objective: (LinearExpr, Sense),
    hints: Vec<(VarHandle, f64)>,
}

impl GoodLpModel {
    fn push(&mut self, var: Variable) -> VarHandle {
        self.handles.push(var);
        VarHandle::new(self.handles.len() - 1)
    }

    fn expression(&self, expr: &LinearExpr) -> Expression {
        let mut out = Expression::from(expr.constant());
        for &(var, coef) in expr.terms() {
            if let Some(v) = self.handles.get(var.index()) {
                out += coef * *v;
            }
        }
        out
    }
}

impl SolverOracle for GoodLpModel {
    fn declare_binary(&mut self, name: &str) -> VarHandle {
        let var = self.vars.add(variable().binary().name(name));
        self.push(var)
    }

    fn declare_continuous(
        &mut self,
        name: &str,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> VarHandle {
        let mut def = variable().name(name);
        if let Some(lower) = lower {
            def = def.min(lower);
        }
        if let Some(upper) = upper {
            def = def.max(upper);
        }
        let var = self.vars.add(def);
        self.push(var)
    }

    fn add_constraint(&mut self, expr: LinearExpr, cmp: Comparator, rhs: f64) {
        self.constraints.push((expr, cmp, rhs));
    }

    fn set_objective(&mut self, expr: LinearExpr, sense: Sense) {
        self.objective = (expr, sense);
    }

    fn hint(&mut self, var: VarHandle, value: f64) {
        self.hints.push((var, value));
    }

    fn solve(self, limits: &SolveLimits) -> SolveOutcome {
        debug!(
            model = %self.name,
            variables = self.handles.len(),
            constraints = self.constraints.len(),
            hints = self.hints.len(),
            time_limit_secs = limits.time_limit.as_secs_f64(),
            "Building microlp problem"
        );

        let objective = self.expression(&self.objective.0);
        let rows: Vec<_> = self
            .constraints
            .iter()
            .map(|(expr, cmp, rhs)| {
                let lhs = self.expression(expr);
                let rhs = *rhs;
                match cmp {
                    Comparator::LessEq => constraint!(lhs <= rhs),
                    Comparator::GreaterEq => constraint!(lhs >= rhs),
                    Comparator::Equal => constraint!(lhs == rhs),
                }
            })
            .collect();
        let initial: Vec<(Variable, f64)> = self
            .hints
            .iter()
            .filter_map(|(var, value)| self.handles.get(var.index()).map(|v| (*v, *value)))
            .collect();

        let GoodLpModel {
            vars,
            handles,
            objective: (objective_expr, sense),
            ..
        } = self;

        let mut problem = match sense {
            Sense::Maximize => vars.maximise(objective).using(default_solver),
            Sense::Minimize => vars.minimise(objective).using(default_solver),
        };
        for row in rows {
            problem = problem.with(row);
        }
        problem = problem.with_time_limit(limits.time_limit.as_secs_f64());
        if !initial.is_empty() {
            problem = problem.with_initial_solution(initial);
        }

        match problem.solve() {
            Ok(solution) => {
                let status = match solution.status() {
                    SolutionStatus::Optimal => SolveStatus::Optimal,
                    SolutionStatus::GapLimit => SolveStatus::Suboptimal,
                    SolutionStatus::TimeLimit => SolveStatus::TimeLimitWithIncumbent,
                };
                let values: Vec<f64> = handles.iter().map(|v| solution.value(*v)).collect();
                SolveOutcome {
                    status,
                    objective_value: Some(objective_expr.eval(&values)),
                    values,
                }
            }
            Err(ResolutionError::Infeasible) => SolveOutcome::without_solution(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => {
                SolveOutcome::without_solution(SolveStatus::InfeasibleOrUnbounded)
            }
            // microlp reports an expired limit with no incumbent this way.
            Err(ResolutionError::Other(reason)) => {
                debug!(reason, "time limit reached before a feasible solution");
                SolveOutcome::without_solution(SolveStatus::TimeLimitNoIncumbent)
            }
            Err(err) => {
                debug!(error = %err, "solver returned an error");
                SolveOutcome::without_solution(SolveStatus::Other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::time::{Duration, Instant};

    fn limits() -> SolveLimits {
        SolveLimits {
            time_limit: Duration::from_secs(5),
            random_seed: Some(7),
        }
    }

    #[test]
    fn test_infeasible_model() {
        let mut model = GoodLpBackend::new().new_model("infeasible");
        let x = model.declare_binary("x");
        model.add_constraint(LinearExpr::from(x), Comparator::GreaterEq, 2.0);
        model.set_objective(LinearExpr::from(x), Sense::Maximize);
        let outcome = model.solve(&limits());
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.values.is_empty());
    }

    #[test]
    fn test_continuous_bounds() {
        let mut model = GoodLpBackend::new().new_model("bounds");
        let y = model.declare_continuous("y", Some(0.0), Some(2.5));
        model.set_objective(LinearExpr::from(y), Sense::Maximize);
        let outcome = model.solve(&limits());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.value_of(y) - 2.5).abs() < 1e-6);
        assert!((outcome.objective_value.unwrap_or_default() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_minimize_with_equality() {
        let mut model = GoodLpBackend::new().new_model("eq");
        let a = model.declare_binary("a");
        let b = model.declare_binary("b");
        let c = model.declare_binary("c");
        model.add_constraint(LinearExpr::sum([a, b, c]), Comparator::Equal, 2.0);
        model.set_objective(
            LinearExpr::new().term(a, 3.0).term(b, 1.0).term(c, 2.0),
            Sense::Minimize,
        );
        let outcome = model.solve(&limits());
        assert!(outcome.value_of(a) < 0.5);
        assert!(outcome.value_of(b) > 0.5);
        assert!(outcome.value_of(c) > 0.5);
    }

    /// Equality rows over random weights whose right-hand side is half the
    /// row sum. Branch and bound needs far longer than a second on these.
    /// With `slack`, each row gets over and under variables, returned summed.
    fn market_split(model: &mut GoodLpModel, slack: bool) -> (Vec<VarHandle>, LinearExpr) {
        let mut rng = StdRng::seed_from_u64(7);
        let xs: Vec<VarHandle> = (0..70).map(|j| model.declare_binary(&format!("x{j}"))).collect();
        let mut slacks = LinearExpr::new();
        for r in 0..8 {
            let mut row = LinearExpr::new();
            let mut total = 0.0;
            for x in &xs {
                let weight = f64::from(rng.gen_range(0u32..100));
                row.add_term(*x, weight);
                total += weight;
            }
            if slack {
                let over = model.declare_continuous(&format!("over{r}"), Some(0.0), None);
                let under = model.declare_continuous(&format!("under{r}"), Some(0.0), None);
                row.add_term(over, -1.0);
                row.add_term(under, 1.0);
                slacks.add_term(over, 1.0);
                slacks.add_term(under, 1.0);
            }
            model.add_constraint(row, Comparator::Equal, (total / 2.0).floor());
        }
        (xs, slacks)
    }

    fn one_second() -> SolveLimits {
        SolveLimits {
            time_limit: Duration::from_secs(1),
            random_seed: None,
        }
    }

    #[test]
    fn test_time_limit_stops_hard_model() {
        let mut model = GoodLpBackend::new().new_model("market_split");
        let (xs, _) = market_split(&mut model, false);
        model.set_objective(LinearExpr::sum(xs), Sense::Maximize);

        let started = Instant::now();
        let outcome = model.solve(&one_second());

        assert!(
            started.elapsed() < Duration::from_secs(10),
            "solve ran for {:?}",
            started.elapsed()
        );
        assert!(matches!(
            outcome.status,
            SolveStatus::TimeLimitNoIncumbent | SolveStatus::TimeLimitWithIncumbent
        ));
    }

    #[test]
    fn test_hint_becomes_incumbent_at_time_limit() {
        let mut model = GoodLpBackend::new().new_model("market_split_slack");
        let (xs, slacks) = market_split(&mut model, true);
        model.set_objective(slacks, Sense::Minimize);
        for x in &xs {
            model.hint(*x, 0.0);
        }

        let started = Instant::now();
        let outcome = model.solve(&one_second());

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(outcome.status.is_feasible(), "status {:?}", outcome.status);
        assert_eq!(outcome.values.len(), 70 + 16);
    }
}
