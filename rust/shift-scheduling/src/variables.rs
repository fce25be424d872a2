//! Decision variable space: one binary per (employee, day, shift type).

use crate::domain::{Employee, ShiftType};
use crate::model::{LinearExpr, SolverOracle, VarHandle};
use crate::period::SchedulingPeriod;

/// Key of one assignment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarKey {
    pub employee: usize,
    pub day: usize,
    pub shift: ShiftType,
}

/// Dense lookup of the `|employees| × |days| × 3` assignment variables.
#[derive(Debug, Clone)]
pub struct DecisionVariables {
    n_employees: usize,
    n_days: usize,
    handles: Vec<VarHandle>,
}

impl DecisionVariables {
    /// Declares every assignment variable on `model`.
    ///
    /// Names follow `x_<employee id>_<day index>_<shift>`.
    pub fn declare<M: SolverOracle>(
        model: &mut M,
        employees: &[Employee],
        period: &SchedulingPeriod,
    ) -> Self {
        let n_days = period.len();
        let mut handles = Vec::with_capacity(employees.len() * n_days * ShiftType::ALL.len());
        for employee in employees {
            for day in 0..n_days {
                for shift in ShiftType::ALL {
                    let name = format!("x_{}_{}_{}", employee.id, day, shift);
                    handles.push(model.declare_binary(&name));
                }
            }
        }
        Self {
            n_employees: employees.len(),
            n_days,
            handles,
        }
    }

    fn offset(&self, employee: usize, day: usize, shift: ShiftType) -> usize {
        (employee * self.n_days + day) * ShiftType::ALL.len() + shift.index()
    }

    pub fn get(&self, employee: usize, day: usize, shift: ShiftType) -> VarHandle {
        self.handles[self.offset(employee, day, shift)]
    }

    pub fn n_employees(&self) -> usize {
        self.n_employees
    }

    pub fn n_days(&self) -> usize {
        self.n_days
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// All variables with their keys, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (VarKey, VarHandle)> + '_ {
        (0..self.n_employees).flat_map(move |employee| {
            (0..self.n_days).flat_map(move |day| {
                ShiftType::ALL.into_iter().map(move |shift| {
                    (
                        VarKey {
                            employee,
                            day,
                            shift,
                        },
                        self.get(employee, day, shift),
                    )
                })
            })
        })
    }

    /// Shifts of one employee on one day.
    pub fn employee_day(&self, employee: usize, day: usize) -> LinearExpr {
        LinearExpr::sum(ShiftType::ALL.map(|s| self.get(employee, day, s)))
    }

    /// Shifts of one employee over `days`.
    pub fn employee_days(
        &self,
        employee: usize,
        days: impl IntoIterator<Item = usize>,
    ) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for day in days {
            for shift in ShiftType::ALL {
                expr.add_term(self.get(employee, day, shift), 1.0);
            }
        }
        expr
    }

    /// Shifts of one employee over the whole period.
    pub fn employee_total(&self, employee: usize) -> LinearExpr {
        self.employee_days(employee, 0..self.n_days)
    }

    /// Assignments of everyone to one slot.
    pub fn slot(&self, day: usize, shift: ShiftType) -> LinearExpr {
        LinearExpr::sum((0..self.n_employees).map(|e| self.get(e, day, shift)))
    }
}
