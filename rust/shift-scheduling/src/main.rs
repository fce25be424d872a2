//! Shift Scheduling command line.
//!
//! Run with: cargo run -p shift-scheduling -- [--config FILE] [--json] [--export] [SMALL|LARGE|problem.json]

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shift_scheduling::backend::GoodLpBackend;
use shift_scheduling::config::SchedulingConfig;
use shift_scheduling::demo_data::{self, DemoData};
use shift_scheduling::dto::ProblemDto;
use shift_scheduling::service::ScheduleService;
use shift_scheduling::solver::OptimizationRequest;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Default, Parser)]
#[command(name = "shift-scheduling", version, about = "Optimizes employee shift schedules")]
struct Args {
    /// TOML file with scheduling settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the result as JSON after the summary
    #[arg(long)]
    json: bool,

    /// Print the problem as JSON instead of solving it
    #[arg(long)]
    export: bool,

    /// Demo set (SMALL, LARGE) or path to a JSON problem
    problem: Option<String>,
}

fn load_request(args: &Args) -> Result<OptimizationRequest, BoxError> {
    let base = match &args.config {
        Some(path) => Some(SchedulingConfig::load(path)?),
        None => None,
    };
    let problem = args.problem.as_deref().unwrap_or(DemoData::Small.as_str());

    if let Ok(demo) = problem.parse::<DemoData>() {
        info!(demo = demo.as_str(), "Generating demo data");
        let mut request = demo_data::generate(demo);
        if let Some(config) = base {
            request.config = config;
        }
        return Ok(request);
    }

    let contents = std::fs::read_to_string(problem).map_err(|err| {
        format!(
            "cannot read problem '{}' ({}); demo sets: {}",
            problem,
            err,
            demo_data::list_demo_data().join(", ")
        )
    })?;
    let dto: ProblemDto = serde_json::from_str(&contents)?;
    Ok(dto.to_request(base.unwrap_or_default()))
}

async fn run(args: Args) -> Result<(), BoxError> {
    let request = load_request(&args)?;
    if args.export {
        println!("{}", serde_json::to_string_pretty(&ProblemDto::from_request(&request))?);
        return Ok(());
    }

    #[cfg(feature = "console")]
    shift_scheduling::console::print_banner();

    let started = Instant::now();
    let service = ScheduleService::new(GoodLpBackend::new());
    let result = service.solve(request).await?;

    #[cfg(feature = "console")]
    shift_scheduling::console::print_summary(&result, started.elapsed());
    #[cfg(not(feature = "console"))]
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "Solved");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "shift_scheduling=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Scheduling failed");
            ExitCode::FAILURE
        }
    }
}
