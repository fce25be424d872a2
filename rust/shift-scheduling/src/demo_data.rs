//! Demo data generators for Shift Scheduling.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SchedulingConfig;
use crate::domain::{Employee, ShiftType};
use crate::preferences::{EmployeePreference, ManualConstraint};
use crate::solver::OptimizationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                department: "Ambulatory care",
                days_in_schedule: 7,
                employee_count: 12,
                config: SchedulingConfig::default()
                    .with_min_staff(1)
                    .with_min_experience(2)
                    .with_partial_coverage(true),
                experience_distribution: vec![(1, 2.0), (2, 3.0), (3, 3.0), (4, 2.0), (5, 1.0)],
                work_percentage_distribution: vec![(100, 6.0), (80, 2.0), (50, 2.0)],
                preference_probability: 0.5,
                manual_constraint_count: 1,
            },
            DemoData::Large => DemoDataParameters {
                department: "Critical care",
                days_in_schedule: 14,
                employee_count: 24,
                config: SchedulingConfig::default()
                    .with_min_staff(2)
                    .with_max_staff(3)
                    .with_min_experience(4)
                    .with_partial_coverage(true),
                experience_distribution: vec![(1, 1.0), (2, 3.0), (3, 3.0), (4, 2.0), (5, 2.0)],
                work_percentage_distribution: vec![(100, 5.0), (80, 3.0), (60, 1.0), (50, 1.0)],
                preference_probability: 0.7,
                manual_constraint_count: 3,
            },
        }
    }
}

struct DemoDataParameters {
    department: &'static str,
    days_in_schedule: i64,
    employee_count: usize,
    config: SchedulingConfig,
    experience_distribution: Vec<(usize, f64)>,
    work_percentage_distribution: Vec<(usize, f64)>,
    preference_probability: f64,
    manual_constraint_count: usize,
}

/// Roles with their weight in the roster and base hourly rate.
const ROLES: &[(&str, f64, f64)] = &[
    ("Doctor", 1.0, 1400.0),
    ("Nurse", 2.0, 1000.0),
    ("Assistant", 1.0, 800.0),
];

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates a demo request for the given size.
pub fn generate(demo: DemoData) -> OptimizationRequest {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let start_date = find_next_monday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default());
    let end_date = start_date + Duration::days(params.days_in_schedule - 1);

    let name_permutations = generate_name_permutations(&mut rng);
    let role_distribution: Vec<(usize, f64)> =
        ROLES.iter().enumerate().map(|(i, (_, w, _))| (i, *w)).collect();

    let mut employees = Vec::with_capacity(params.employee_count);
    for i in 0..params.employee_count {
        let name = name_permutations[i % name_permutations.len()].clone();
        let (role, _, base_rate) = ROLES[pick_count(&mut rng, &role_distribution)];
        let experience = pick_count(&mut rng, &params.experience_distribution) as u32;
        let work_percentage = pick_count(&mut rng, &params.work_percentage_distribution) as u32;

        employees.push(
            Employee::new(format!("E{:03}", i + 1), name)
                .with_department(params.department)
                .with_role(role)
                .with_experience(experience)
                .with_hourly_rate(base_rate + 50.0 * experience as f64)
                .with_work_percentage(work_percentage),
        );
    }

    let dates: Vec<NaiveDate> = (0..params.days_in_schedule)
        .map(|d| start_date + Duration::days(d))
        .collect();

    let mut preferences = Vec::new();
    for employee in &employees {
        if !rng.gen_bool(params.preference_probability) {
            continue;
        }
        let pref = EmployeePreference::new(employee.id.clone());
        let date = dates.choose(&mut rng).copied().unwrap_or(start_date).to_string();
        let shift = random_shift(&mut rng).as_str();
        let pref = match rng.gen_range(0..5) {
            0 => pref.with_excluded_days(&[weekday_name(random_weekday(&mut rng))]),
            1 => pref.with_preferred_shifts(&[shift], false),
            2 => pref.with_medium_block(&date, &[shift]),
            3 => pref.with_hard_block(&date, &[shift]),
            _ => pref.with_max_shifts_per_week(rng.gen_range(2..=4)),
        };
        preferences.push(pref);
    }

    let manual_constraints = employees
        .choose_multiple(&mut rng, params.manual_constraint_count)
        .map(|employee| {
            let date = dates.choose(&mut rng).copied().unwrap_or(start_date);
            ManualConstraint::new(employee.id.clone(), vec![date], false)
                .with_shifts(&[random_shift(&mut rng).as_str()])
        })
        .collect();

    OptimizationRequest::new(employees, start_date, end_date)
        .with_config(params.config.with_random_seed(0))
        .with_preferences(preferences)
        .with_manual_constraints(manual_constraints)
}

fn random_shift(rng: &mut StdRng) -> ShiftType {
    ShiftType::ALL[rng.gen_range(0..ShiftType::ALL.len())]
}

fn random_weekday(rng: &mut StdRng) -> Weekday {
    Weekday::try_from(rng.gen_range(0u8..7)).unwrap_or(Weekday::Mon)
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

fn find_next_monday(date: NaiveDate) -> NaiveDate {
    let days_until_monday = match date.weekday() {
        Weekday::Mon => 0,
        Weekday::Tue => 6,
        Weekday::Wed => 5,
        Weekday::Thu => 4,
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        Weekday::Sun => 1,
    };
    date + Duration::days(days_until_monday)
}

/// Pick a value based on weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(usize, f64)]) -> usize {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (count, weight) in distribution {
        if choice < *weight {
            return *count;
        }
        choice -= weight;
    }
    distribution.last().map(|(c, _)| *c).unwrap_or(1)
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{} {}", first, last));
        }
    }
    names.shuffle(rng);
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::CapacityReport;
    use crate::period::SchedulingPeriod;
    use std::collections::HashSet;

    #[test]
    fn test_generate_small() {
        let request = generate(DemoData::Small);

        assert_eq!(request.employees.len(), 12);
        assert_eq!(request.start_date.weekday(), Weekday::Mon);
        assert_eq!((request.end_date - request.start_date).num_days(), 6);
        assert_eq!(request.config.random_seed, Some(0));
        assert!(request.config.validate().is_ok());
    }

    #[test]
    fn test_generate_large() {
        let request = generate(DemoData::Large);

        assert_eq!(request.employees.len(), 24);
        assert_eq!((request.end_date - request.start_date).num_days(), 13);
        assert_eq!(request.manual_constraints.len(), 3);
        assert!(request.manual_constraints.iter().all(|c| !c.is_hard));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate(DemoData::Small);
        let b = generate(DemoData::Small);
        assert_eq!(a.employees, b.employees);
        assert_eq!(a.preferences, b.preferences);
        assert_eq!(a.manual_constraints, b.manual_constraints);
    }

    #[test]
    fn test_medical_roster() {
        let request = generate(DemoData::Large);
        let roles: HashSet<_> = request
            .employees
            .iter()
            .filter_map(|e| e.role.as_deref())
            .collect();

        assert!(roles.contains("Doctor") || roles.contains("Nurse"));
        for employee in &request.employees {
            assert!((1..=5).contains(&employee.experience_level));
            assert!(employee.hourly_rate > 800.0);
            assert_eq!(employee.department, "Critical care");
        }
    }

    #[test]
    fn test_preferences_reference_roster() {
        let request = generate(DemoData::Large);
        let ids: HashSet<_> = request.employees.iter().map(|e| e.id.as_str()).collect();

        assert!(!request.preferences.is_empty());
        for pref in &request.preferences {
            assert!(ids.contains(pref.employee_id.as_str()));
        }
        for constraint in &request.manual_constraints {
            assert!(constraint
                .dates
                .iter()
                .all(|d| (request.start_date..=request.end_date).contains(d)));
        }
    }

    #[test]
    fn test_demo_has_capacity() {
        for demo in [DemoData::Small, DemoData::Large] {
            let request = generate(demo);
            let period = SchedulingPeriod::new(
                request.start_date,
                request.end_date,
                request.config.include_weekends,
                request.config.max_period_days,
            )
            .unwrap();
            let report = CapacityReport::assess(&request.employees, &period, &request.config);
            assert!(report
                .check(request.employees.len(), &period, false)
                .is_ok());
        }
    }

    #[test]
    fn test_demo_data_from_str() {
        assert_eq!("SMALL".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("small".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("LARGE".parse::<DemoData>(), Ok(DemoData::Large));
        assert!("invalid".parse::<DemoData>().is_err());
        assert_eq!(list_demo_data(), vec![DemoData::Small.as_str(), DemoData::Large.as_str()]);
    }
}
