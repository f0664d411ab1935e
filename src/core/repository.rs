use std::{
    cell::{Cell, RefCell},
    time::Instant,
};

use log::debug;
use uuid::Uuid;

use crate::BatchError;

/// Status of a job run.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BatchStatus {
    /// Registered, not launched yet.
    NotStarted,
    /// Steps are being executed.
    Running,
    /// Every step succeeded.
    Completed,
    /// A step failed; the run is over.
    Failed,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }

    /// `NotStarted -> Running -> Completed | Failed`.
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::NotStarted, BatchStatus::Running)
                | (BatchStatus::Running, BatchStatus::Completed)
                | (BatchStatus::Running, BatchStatus::Failed)
        )
    }
}

/// Ledger entry of one job run.
#[derive(Debug, Clone)]
pub struct JobExecutionRecord {
    pub id: Uuid,
    /// Incremented on every launch, starting at 1.
    pub run_id: u64,
    pub job_name: String,
    pub status: BatchStatus,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
    /// Error message of a failed run.
    pub exit_message: Option<String>,
}

/// Job repository kept in process memory.
///
/// Nothing is ever written to disk: the ledger is gone when the repository is
/// dropped. Only one job runs at a time, so interior mutability is enough.
#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    executions: RefCell<Vec<JobExecutionRecord>>,
    last_run_id: Cell<u64>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_run_id(&self) -> u64 {
        let run_id = self.last_run_id.get() + 1;
        self.last_run_id.set(run_id);
        run_id
    }

    /// Registers a new run of `job_name` with a fresh run id.
    pub fn create_job_execution(&self, job_name: &str) -> JobExecutionRecord {
        let record = JobExecutionRecord {
            id: Uuid::new_v4(),
            run_id: self.next_run_id(),
            job_name: job_name.to_owned(),
            status: BatchStatus::NotStarted,
            start_time: None,
            end_time: None,
            exit_message: None,
        };

        debug!(
            "Job execution created: {}, run.id: {}",
            record.job_name, record.run_id
        );

        self.executions.borrow_mut().push(record.clone());
        record
    }

    /// Moves a run to `status`, stamping start or end times on the way.
    ///
    /// Fails when the run id is unknown or the transition is not allowed,
    /// which includes any transition out of a terminal status.
    pub fn update_status(
        &self,
        run_id: u64,
        status: BatchStatus,
        exit_message: Option<String>,
    ) -> Result<JobExecutionRecord, BatchError> {
        let mut executions = self.executions.borrow_mut();
        let record = executions
            .iter_mut()
            .find(|record| record.run_id == run_id)
            .ok_or_else(|| BatchError::JobRepository(format!("unknown run.id {}", run_id)))?;

        if !record.status.can_transition_to(status) {
            return Err(BatchError::JobRepository(format!(
                "run.id {} cannot go from {:?} to {:?}",
                run_id, record.status, status
            )));
        }

        match status {
            BatchStatus::Running => record.start_time = Some(Instant::now()),
            BatchStatus::Completed | BatchStatus::Failed => {
                record.end_time = Some(Instant::now())
            }
            BatchStatus::NotStarted => {}
        }
        record.status = status;
        record.exit_message = exit_message;

        Ok(record.clone())
    }

    pub fn get_job_execution(&self, run_id: u64) -> Option<JobExecutionRecord> {
        self.executions
            .borrow()
            .iter()
            .find(|record| record.run_id == run_id)
            .cloned()
    }

    /// Every run of `job_name`, oldest first.
    pub fn find_job_executions(&self, job_name: &str) -> Vec<JobExecutionRecord> {
        self.executions
            .borrow()
            .iter()
            .filter(|record| record.job_name == job_name)
            .cloned()
            .collect()
    }

    pub fn last_job_execution(&self, job_name: &str) -> Option<JobExecutionRecord> {
        self.executions
            .borrow()
            .iter()
            .rev()
            .find(|record| record.job_name == job_name)
            .cloned()
    }

    /// Distinct job names, in order of first run.
    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in self.executions.borrow().iter() {
            if !names.contains(&record.job_name) {
                names.push(record.job_name.clone());
            }
        }
        names
    }
}
