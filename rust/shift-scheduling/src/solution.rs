//! Reads a solved assignment back into schedule rows and statistics.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::CoverageDenominator;
use crate::constraints::ModelContext;
use crate::domain::{ScheduleAssignment, ShiftType};
use crate::model::SolveOutcome;
use crate::variables::DecisionVariables;

/// Solved values above this count as assigned.
pub const ASSIGNED_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStatistics {
    pub total_shifts: u32,
    pub filled_shifts: u32,
    /// `filled / total × 100`, one decimal, clamped to `[0, 100]`.
    pub coverage_percentage: f64,
    pub denominator: CoverageDenominator,
    pub total_hours: f64,
    pub total_cost: f64,
}

/// Spread of one per-employee count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeStats {
    pub min: u32,
    pub max: u32,
    pub avg: f64,
    pub range: u32,
}

impl RangeStats {
    /// ```
    /// use shift_scheduling::solution::RangeStats;
    ///
    /// let stats = RangeStats::from_counts(&[2, 3, 3]);
    /// assert_eq!((stats.min, stats.max, stats.range), (2, 3, 1));
    /// assert_eq!(stats.avg, 2.7);
    /// ```
    pub fn from_counts(counts: &[u32]) -> Self {
        let (Some(min), Some(max)) = (counts.iter().min(), counts.iter().max()) else {
            return Self {
                min: 0,
                max: 0,
                avg: 0.0,
                range: 0,
            };
        };
        let avg = counts.iter().map(|c| f64::from(*c)).sum::<f64>() / counts.len() as f64;
        Self {
            min: *min,
            max: *max,
            avg: round1(avg),
            range: max - min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessStatistics {
    pub total_shifts: RangeStats,
    pub shift_types: BTreeMap<ShiftType, RangeStats>,
    pub weekend_shifts: RangeStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBreakdown {
    pub employee_id: String,
    pub name: String,
    pub total_shifts: u32,
    pub shift_counts: BTreeMap<ShiftType, u32>,
    pub weekend_shifts: u32,
    pub hours: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UncoveredReason {
    /// Weekend outside coverage or a zero minimum.
    NotRequired,
    /// Every employee is gated off this night slot by role.
    NoQualifiedStaff,
    /// Every employee is excluded by role or by their rules.
    AllExcluded,
    /// Someone was eligible but was capped or busy elsewhere.
    InsufficientPool,
}

/// A slot that received no assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncoveredSlot {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub required_staff: u32,
    pub reason: UncoveredReason,
}

/// Everything extracted from one feasible outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSchedule {
    pub schedule: Vec<ScheduleAssignment>,
    pub coverage: CoverageStatistics,
    pub fairness: FairnessStatistics,
    pub employee_stats: Vec<EmployeeBreakdown>,
    pub uncovered: Vec<UncoveredSlot>,
}

/// Turns solved values into schedule rows and statistics.
pub fn extract(
    outcome: &SolveOutcome,
    vars: &DecisionVariables,
    ctx: &ModelContext<'_>,
) -> ExtractedSchedule {
    let mut breakdowns: Vec<EmployeeBreakdown> = ctx
        .employees
        .iter()
        .map(|e| EmployeeBreakdown {
            employee_id: e.id.clone(),
            name: e.name.clone(),
            total_shifts: 0,
            shift_counts: ShiftType::ALL.iter().map(|s| (*s, 0)).collect(),
            weekend_shifts: 0,
            hours: 0.0,
            cost: 0.0,
        })
        .collect();
    let mut slot_counts = vec![[0u32; 3]; ctx.period.len()];
    let mut schedule = Vec::new();

    for (key, var) in vars.iter() {
        if outcome.value_of(var) <= ASSIGNED_THRESHOLD {
            continue;
        }
        let employee = &ctx.employees[key.employee];
        let day = &ctx.period.days()[key.day];
        let window = key.shift.window();
        let hours = window.duration_hours();
        let cost = hours * employee.hourly_rate;

        schedule.push(ScheduleAssignment {
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            department: employee.department.clone(),
            date: day.date,
            shift_type: key.shift,
            start: window.starts_at(day.date),
            end: window.ends_at(day.date),
            hours,
            hourly_rate: employee.hourly_rate,
            cost,
            experience_level: employee.experience_level,
            is_weekend: day.is_weekend(),
        });

        slot_counts[key.day][key.shift.index()] += 1;
        let breakdown = &mut breakdowns[key.employee];
        breakdown.total_shifts += 1;
        *breakdown.shift_counts.entry(key.shift).or_default() += 1;
        if day.is_weekend() {
            breakdown.weekend_shifts += 1;
        }
        breakdown.hours += hours;
        breakdown.cost += cost;
    }

    schedule.sort_by(|a, b| {
        (a.date, a.shift_type, &a.employee_id).cmp(&(b.date, b.shift_type, &b.employee_id))
    });

    let coverage = coverage_statistics(&schedule, ctx);
    let fairness = fairness_statistics(&breakdowns);
    let uncovered = uncovered_slots(&slot_counts, ctx);

    ExtractedSchedule {
        schedule,
        coverage,
        fairness,
        employee_stats: breakdowns,
        uncovered,
    }
}

fn coverage_statistics(schedule: &[ScheduleAssignment], ctx: &ModelContext<'_>) -> CoverageStatistics {
    let denominator = ctx.config.coverage_denominator;
    let n_days = ctx.period.len() as u32;
    let total_shifts = match denominator {
        CoverageDenominator::Slots => n_days * ShiftType::ALL.len() as u32,
        // Days outside coverage require nobody.
        CoverageDenominator::StaffedPositions => ctx
            .period
            .days()
            .iter()
            .flat_map(|day| ShiftType::ALL.map(|shift| ctx.slot_bounds(day, shift).min_staff))
            .sum(),
    };
    let filled_shifts = schedule.len() as u32;
    let coverage_percentage = if total_shifts == 0 {
        100.0
    } else {
        round1(f64::from(filled_shifts) / f64::from(total_shifts) * 100.0).clamp(0.0, 100.0)
    };

    CoverageStatistics {
        total_shifts,
        filled_shifts,
        coverage_percentage,
        denominator,
        total_hours: schedule.iter().map(|a| a.hours).sum(),
        total_cost: schedule.iter().map(|a| a.cost).sum(),
    }
}

fn fairness_statistics(breakdowns: &[EmployeeBreakdown]) -> FairnessStatistics {
    let totals: Vec<u32> = breakdowns.iter().map(|b| b.total_shifts).collect();
    let weekends: Vec<u32> = breakdowns.iter().map(|b| b.weekend_shifts).collect();
    let shift_types = ShiftType::ALL
        .iter()
        .map(|shift| {
            let counts: Vec<u32> = breakdowns
                .iter()
                .map(|b| b.shift_counts.get(shift).copied().unwrap_or(0))
                .collect();
            (*shift, RangeStats::from_counts(&counts))
        })
        .collect();

    FairnessStatistics {
        total_shifts: RangeStats::from_counts(&totals),
        shift_types,
        weekend_shifts: RangeStats::from_counts(&weekends),
    }
}

fn uncovered_slots(slot_counts: &[[u32; 3]], ctx: &ModelContext<'_>) -> Vec<UncoveredSlot> {
    let mut uncovered = Vec::new();
    for day in ctx.period.days() {
        for shift in ShiftType::ALL {
            if slot_counts[day.index][shift.index()] > 0 {
                continue;
            }
            let required_staff = ctx.slot_bounds(day, shift).min_staff;
            let reason = if required_staff == 0 {
                UncoveredReason::NotRequired
            } else {
                let gated = |e: usize| {
                    shift == ShiftType::Night
                        && ctx.config.qualification.require_night_qualification
                        && ctx.night_disqualified(e)
                };
                let n = ctx.employees.len();
                if (0..n).all(gated) {
                    UncoveredReason::NoQualifiedStaff
                } else if (0..n)
                    .all(|e| gated(e) || ctx.rules.hard_exclusion(e, day, shift).is_some())
                {
                    UncoveredReason::AllExcluded
                } else {
                    UncoveredReason::InsufficientPool
                }
            };
            uncovered.push(UncoveredSlot {
                date: day.date,
                shift_type: shift,
                required_staff,
                reason,
            });
        }
    }
    uncovered
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulingConfig;
    use crate::domain::Employee;
    use crate::model::testing::ScriptedBackend;
    use crate::model::{SolveStatus, SolverBackend};
    use crate::period::SchedulingPeriod;
    use crate::preferences::{EmployeePreference, RuleBook};

    struct Fixture {
        employees: Vec<Employee>,
        period: SchedulingPeriod,
        config: SchedulingConfig,
        rules: RuleBook,
    }

    impl Fixture {
        fn new(employees: Vec<Employee>, days: u32, config: SchedulingConfig) -> Self {
            // 2024-08-02 is a Friday
            let start = NaiveDate::from_ymd_opt(2024, 8, 2).unwrap();
            let end = NaiveDate::from_ymd_opt(2024, 8, 1 + days).unwrap();
            let period =
                SchedulingPeriod::new(start, end, config.include_weekends, 31).unwrap();
            let rules = RuleBook::empty(employees.len());
            Self {
                employees,
                period,
                config,
                rules,
            }
        }

        fn ctx(&self) -> ModelContext<'_> {
            ModelContext {
                employees: &self.employees,
                period: &self.period,
                config: &self.config,
                rules: &self.rules,
                experience_cap: None,
            }
        }

        /// Solves nothing; marks the given triples as assigned.
        fn extract(&self, assigned: &[(usize, usize, ShiftType)]) -> ExtractedSchedule {
            let mut model = ScriptedBackend::default().new_model("extract");
            let vars = DecisionVariables::declare(&mut model, &self.employees, &self.period);
            let mut values = vec![0.0; vars.len()];
            for &(e, d, s) in assigned {
                values[vars.get(e, d, s).index()] = 1.0;
            }
            let outcome = SolveOutcome {
                status: SolveStatus::Optimal,
                objective_value: Some(0.0),
                values,
            };
            extract(&outcome, &vars, &self.ctx())
        }
    }

    fn roster() -> Vec<Employee> {
        vec![
            Employee::new("b", "Bob Diaz").with_hourly_rate(200.0),
            Employee::new("a", "Amy Cole").with_experience(3),
        ]
    }

    #[test]
    fn test_rows_ordered_and_timed() {
        let fx = Fixture::new(roster(), 2, SchedulingConfig::default());
        let out = fx.extract(&[
            (0, 1, ShiftType::Night),
            (1, 0, ShiftType::Evening),
            (0, 0, ShiftType::Evening),
        ]);

        let ids: Vec<_> = out
            .schedule
            .iter()
            .map(|a| (a.date.to_string(), a.shift_type, a.employee_id.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("2024-08-02".to_string(), ShiftType::Evening, "a"),
                ("2024-08-02".to_string(), ShiftType::Evening, "b"),
                ("2024-08-03".to_string(), ShiftType::Night, "b"),
            ]
        );
        let night = &out.schedule[2];
        assert_eq!(night.end.to_string(), "2024-08-04 06:00:00");
        assert_eq!(night.cost, 1600.0);
        assert!(night.is_weekend);
        assert_eq!(out.schedule[0].experience_level, 3);
    }

    #[test]
    fn test_coverage_and_breakdowns() {
        let fx = Fixture::new(roster(), 2, SchedulingConfig::default());
        let out = fx.extract(&[
            (0, 0, ShiftType::Day),
            (1, 0, ShiftType::Evening),
            (0, 1, ShiftType::Night),
        ]);

        assert_eq!(out.coverage.total_shifts, 6);
        assert_eq!(out.coverage.filled_shifts, 3);
        assert_eq!(out.coverage.coverage_percentage, 50.0);
        assert_eq!(out.coverage.total_hours, 24.0);
        assert_eq!(out.coverage.total_cost, 1600.0 * 2.0 + 8000.0);

        let bob = &out.employee_stats[0];
        assert_eq!(bob.total_shifts, 2);
        assert_eq!(bob.weekend_shifts, 1);
        assert_eq!(bob.shift_counts[&ShiftType::Night], 1);

        assert_eq!(out.fairness.total_shifts.range, 1);
        assert_eq!(out.fairness.total_shifts.avg, 1.5);
        assert_eq!(out.fairness.weekend_shifts.max, 1);
        assert_eq!(out.fairness.shift_types[&ShiftType::Day].min, 0);
    }

    #[test]
    fn test_coverage_clamped_and_staffed_positions() {
        let config = SchedulingConfig::default().with_min_staff(2);
        let fx = Fixture::new(roster(), 1, config.clone());
        let out = fx.extract(&[(0, 0, ShiftType::Day), (1, 0, ShiftType::Day)]);
        assert_eq!(out.coverage.coverage_percentage, 66.7);

        let all: Vec<_> = (0..2)
            .flat_map(|e| ShiftType::ALL.map(|s| (e, 0, s)))
            .collect();
        let over = Fixture::new(roster(), 1, config.clone());
        // two per slot on one day is not possible, but the percentage still clamps
        let out = over.extract(&all);
        assert_eq!(out.coverage.coverage_percentage, 100.0);

        let mut staffed = config;
        staffed.coverage_denominator = CoverageDenominator::StaffedPositions;
        let fx = Fixture::new(roster(), 1, staffed);
        let out = fx.extract(&[(0, 0, ShiftType::Day), (1, 0, ShiftType::Day)]);
        assert_eq!(out.coverage.total_shifts, 6);
        assert_eq!(out.coverage.coverage_percentage, 33.3);
    }

    #[test]
    fn test_staffed_positions_skip_uncovered_weekend() {
        let mut config = SchedulingConfig::default().with_weekends(false);
        config.coverage_denominator = CoverageDenominator::StaffedPositions;
        // Friday, Saturday, Sunday
        let fx = Fixture::new(roster(), 3, config);

        let out = fx.extract(&[(0, 0, ShiftType::Day), (1, 0, ShiftType::Evening)]);
        assert_eq!(out.coverage.total_shifts, 3);
        assert_eq!(out.coverage.coverage_percentage, 66.7);

        let out = fx.extract(&[
            (0, 0, ShiftType::Day),
            (1, 0, ShiftType::Evening),
            (0, 1, ShiftType::Day),
        ]);
        assert_eq!(out.coverage.coverage_percentage, 100.0);

        let mut closed = SchedulingConfig::default().with_min_staff(0);
        closed.coverage_denominator = CoverageDenominator::StaffedPositions;
        let fx = Fixture::new(roster(), 1, closed);
        let out = fx.extract(&[]);
        assert_eq!(out.coverage.total_shifts, 0);
        assert_eq!(out.coverage.coverage_percentage, 100.0);
    }

    #[test]
    fn test_uncovered_reasons() {
        let employees = vec![
            Employee::new("a", "Amy Cole").with_role("Assistant"),
            Employee::new("b", "Bob Diaz").with_role("Nurse"),
        ];
        let mut fx = Fixture::new(employees, 2, SchedulingConfig::default().with_weekends(false));
        let prefs = vec![EmployeePreference::new("b").with_hard_block("2024-08-02", &["night"])];
        fx.rules = RuleBook::compile(&fx.employees, &fx.period, &prefs, &[]);

        let out = fx.extract(&[(0, 0, ShiftType::Day), (1, 0, ShiftType::Evening)]);
        let reason = |d: usize, s: ShiftType| {
            out.uncovered
                .iter()
                .find(|u| u.date == fx.period.days()[d].date && u.shift_type == s)
                .map(|u| u.reason)
        };
        assert_eq!(reason(0, ShiftType::Day), None);
        assert_eq!(reason(0, ShiftType::Night), Some(UncoveredReason::AllExcluded));
        // Saturday is outside coverage
        assert_eq!(reason(1, ShiftType::Day), Some(UncoveredReason::NotRequired));
        assert_eq!(out.uncovered.len(), 4);
    }

    #[test]
    fn test_no_qualified_staff() {
        let employees = vec![Employee::new("a", "Amy Cole").with_role("Assistant")];
        let fx = Fixture::new(employees, 1, SchedulingConfig::default());
        let out = fx.extract(&[(0, 0, ShiftType::Day)]);
        let night = out
            .uncovered
            .iter()
            .find(|u| u.shift_type == ShiftType::Night)
            .unwrap();
        assert_eq!(night.reason, UncoveredReason::NoQualifiedStaff);
        let evening = out
            .uncovered
            .iter()
            .find(|u| u.shift_type == ShiftType::Evening)
            .unwrap();
        assert_eq!(evening.reason, UncoveredReason::InsufficientPool);
    }

    #[test]
    fn test_empty_range_stats() {
        let stats = RangeStats::from_counts(&[]);
        assert_eq!(stats.range, 0);
        assert_eq!(stats.avg, 0.0);
    }
}
