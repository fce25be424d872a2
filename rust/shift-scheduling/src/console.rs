//! Colorful console output for optimization runs.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::model::SolveStatus;
use crate::solver::ScheduleResult;

/// ASCII art banner for startup.
pub fn print_banner() {
    let banner = r#"
  ____  _     _  __ _     ____       _              _       _
 / ___|| |__ (_)/ _| |_  / ___|  ___| |__   ___  __| |_   _| | ___
 \___ \| '_ \| | |_| __| \___ \ / __| '_ \ / _ \/ _` | | | | |/ _ \
  ___) | | | | |  _| |_   ___) | (__| | | |  __/ (_| | |_| | |  __/
 |____/|_| |_|_|_|  \__| |____/ \___|_| |_|\___|\__,_|\__,_|_|\___|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Shift Scheduling".bright_cyan()
    );
}

/// Prints the problem dimensions before the first attempt.
pub fn print_problem(employees: usize, days: usize, experience: u32) {
    let binaries = employees * days * 3;
    println!(
        "{} {} {} Problem: employees ({}), days ({}), assignment variables ({}), experience per shift ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        employees.to_formatted_string(&Locale::en).bright_yellow(),
        days.to_formatted_string(&Locale::en).bright_yellow(),
        binaries.to_formatted_string(&Locale::en).bright_yellow(),
        experience.to_string().bright_yellow()
    );
}

/// Prints the result of one attempt on the relaxation ladder.
pub fn print_attempt(attempt: usize, experience: u32, status: SolveStatus, elapsed: Duration) {
    let status_str = if status.is_feasible() {
        status.as_str().bright_green().to_string()
    } else {
        status.as_str().bright_red().to_string()
    };
    println!(
        "    {} Attempt {:>2} │ experience {:>2} │ {} │ {}",
        "→".bright_blue(),
        attempt,
        experience,
        format!("{:>8}", format_duration(elapsed)).bright_black(),
        status_str
    );
}

/// Prints the final summary box (60 chars wide, 56 char content area).
pub fn print_summary(result: &ScheduleResult, total_duration: Duration) {
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());

    let complete = result.coverage.coverage_percentage >= 100.0;
    let status_text = match (&result.relaxation, complete) {
        (None, true) => "✓ SCHEDULE FOUND",
        (None, false) => "✓ PARTIAL SCHEDULE FOUND",
        (Some(_), _) => "✓ SCHEDULE FOUND (RELAXED)",
    };
    let status_colored = if result.relaxation.is_none() && complete {
        status_text.bright_green().bold().to_string()
    } else {
        status_text.yellow().bold().to_string()
    };
    let status_padding = 56 - status_text.chars().count();
    let left_pad = status_padding / 2;
    let right_pad = status_padding - left_pad;
    println!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        status_colored,
        " ".repeat(right_pad),
        "║".bright_cyan()
    );

    println!("{}", "╠══════════════════════════════════════════════════════════╣".bright_cyan());

    summary_row(
        "Coverage:",
        &format!(
            "{}/{} ({:.1}%)",
            result.coverage.filled_shifts,
            result.coverage.total_shifts,
            result.coverage.coverage_percentage
        ),
    );
    summary_row(
        "Assignments:",
        &result.schedule.len().to_formatted_string(&Locale::en),
    );
    summary_row("Total Hours:", &format!("{:.1}", result.coverage.total_hours));
    summary_row(
        "Total Cost:",
        &(result.coverage.total_cost.round() as i64).to_formatted_string(&Locale::en),
    );
    if let Some(note) = &result.relaxation {
        summary_row(
            "Experience:",
            &format!("{} → {}", note.original_experience, note.used_experience),
        );
    }
    summary_row("Solver Status:", result.status.as_str());
    summary_row("Solving Time:", &format!("{:.2}s", total_duration.as_secs_f64()));

    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

fn summary_row(label: &str, value: &str) {
    println!(
        "{}  {:<18}{:>36}  {}",
        "║".bright_cyan(),
        label,
        value,
        "║".bright_cyan()
    );
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}
