//! Background scheduling jobs.
//!
//! Each job runs [`optimize`] on a blocking worker with its own model. Jobs
//! share nothing but the read-only backend handle.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{FailureContext, SchedulingError};
use crate::model::SolverBackend;
use crate::solver::{optimize, OptimizationRequest, ScheduleResult};

/// Status of a scheduling job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    NotSolving,
    Solving,
}

impl JobStatus {
    /// ```
    /// use shift_scheduling::service::JobStatus;
    ///
    /// assert_eq!(JobStatus::NotSolving.as_str(), "NOT_SOLVING");
    /// assert_eq!(JobStatus::Solving.as_str(), "SOLVING");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::NotSolving => "NOT_SOLVING",
            JobStatus::Solving => "SOLVING",
        }
    }
}

/// Final outcome of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JobOutcome {
    Solved(Box<ScheduleResult>),
    Failed {
        message: String,
        context: Option<FailureContext>,
    },
}

impl From<Result<ScheduleResult, SchedulingError>> for JobOutcome {
    fn from(result: Result<ScheduleResult, SchedulingError>) -> Self {
        match result {
            Ok(schedule) => JobOutcome::Solved(Box::new(schedule)),
            Err(err) => JobOutcome::Failed {
                message: err.to_string(),
                context: err.failure_context().cloned(),
            },
        }
    }
}

/// One submitted request and its state.
pub struct ScheduleJob {
    pub id: String,
    pub status: JobStatus,
    pub request: OptimizationRequest,
    pub outcome: Option<JobOutcome>,
}

/// Runs scheduling jobs in the background.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use shift_scheduling::backend::GoodLpBackend;
/// use shift_scheduling::domain::Employee;
/// use shift_scheduling::service::{JobOutcome, ScheduleService};
/// use shift_scheduling::solver::OptimizationRequest;
///
/// # tokio_test();
/// # #[tokio::main(flavor = "multi_thread")]
/// # async fn tokio_test() {
/// let service = ScheduleService::new(GoodLpBackend::new());
/// let day = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
/// let employees = (1..=3).map(|i| Employee::new(format!("e{i}"), format!("Employee {i}"))).collect();
///
/// let id = service.submit(OptimizationRequest::new(employees, day, day));
/// let outcome = service.wait(&id).await.unwrap();
/// assert!(matches!(outcome, JobOutcome::Solved(_)));
/// # }
/// ```
pub struct ScheduleService<B> {
    backend: Arc<B>,
    jobs: RwLock<HashMap<String, Arc<RwLock<ScheduleJob>>>>,
}

impl<B> ScheduleService<B>
where
    B: SolverBackend + 'static,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Solves one request on a blocking worker without registering a job.
    pub async fn solve(
        &self,
        request: OptimizationRequest,
    ) -> Result<ScheduleResult, SchedulingError> {
        let backend = self.backend.clone();
        tokio::task::spawn_blocking(move || optimize(backend.as_ref(), &request))
            .await
            .map_err(|err| SchedulingError::TaskFailed(err.to_string()))?
    }

    /// Registers a job and starts solving it in the background.
    pub fn submit(&self, request: OptimizationRequest) -> String {
        let id = Uuid::new_v4().to_string();
        let job = Arc::new(RwLock::new(ScheduleJob {
            id: id.clone(),
            status: JobStatus::Solving,
            request,
            outcome: None,
        }));
        self.jobs.write().insert(id.clone(), job.clone());

        let backend = self.backend.clone();
        tokio::task::spawn_blocking(move || {
            let request = job.read().request.clone();
            let job_id = job.read().id.clone();
            info!(job_id = %job_id, employees = request.employees.len(), "Job started");

            let outcome = JobOutcome::from(optimize(backend.as_ref(), &request));
            match &outcome {
                JobOutcome::Solved(result) => info!(
                    job_id = %job_id,
                    coverage = result.coverage.coverage_percentage,
                    "Job solved"
                ),
                JobOutcome::Failed { message, .. } => {
                    warn!(job_id = %job_id, error = %message, "Job failed")
                }
            }

            let mut guard = job.write();
            guard.outcome = Some(outcome);
            guard.status = JobStatus::NotSolving;
        });

        id
    }

    pub fn get_job(&self, id: &str) -> Option<Arc<RwLock<ScheduleJob>>> {
        self.jobs.read().get(id).cloned()
    }

    pub fn status(&self, id: &str) -> Option<JobStatus> {
        self.get_job(id).map(|job| job.read().status)
    }

    pub fn outcome(&self, id: &str) -> Option<JobOutcome> {
        self.get_job(id).and_then(|job| job.read().outcome.clone())
    }

    pub fn list_jobs(&self) -> Vec<String> {
        self.jobs.read().keys().cloned().collect()
    }

    pub fn remove_job(&self, id: &str) -> Option<Arc<RwLock<ScheduleJob>>> {
        self.jobs.write().remove(id)
    }

    /// Polls until the job stops solving. `None` for an unknown id.
    pub async fn wait(&self, id: &str) -> Option<JobOutcome> {
        loop {
            let job = self.get_job(id)?;
            if job.read().status == JobStatus::NotSolving {
                return job.read().outcome.clone();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
