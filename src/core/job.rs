use std::time::{Duration, Instant};

use log::{error, info};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    step::{Step, StepExecution},
};

/// Type alias for job execution results.
///
/// A `JobResult` is a `Result` that contains either:
/// - A successful `JobExecution` with execution details
/// - A `BatchError` indicating what went wrong
pub type JobResult<T> = Result<T, BatchError>;

/// Represents a job that can be executed.
///
/// A job is a container for a sequence of steps that are executed in order.
/// The job is responsible for orchestrating the steps and reporting the
/// overall result. Bookkeeping of runs (run id, status) is left to the
/// [`JobLauncher`](super::launcher::JobLauncher).
pub trait Job {
    /// Name under which runs of this job are recorded.
    fn get_name(&self) -> &str;

    /// Runs the job and returns the result of the job execution.
    ///
    /// # Returns
    /// - `Ok(JobExecution)` when every step succeeds
    /// - `Err(BatchError)` with the error of the first failing step
    fn run(&self) -> JobResult<JobExecution>;
}

/// Represents the execution of a job.
///
/// Contains timing information about a job run and the executions of the
/// steps it ran.
#[derive(Debug)]
pub struct JobExecution {
    /// The time when the job started executing
    pub start: Instant,
    /// The time when the job finished executing
    pub end: Instant,
    /// The total duration of the job execution
    pub duration: Duration,
    /// Executions of the steps, in run order
    pub step_executions: Vec<StepExecution>,
}

impl JobExecution {
    /// Total number of items written by all steps.
    pub fn write_count(&self) -> usize {
        self.step_executions.iter().map(|step| step.write_count).sum()
    }

    /// Total number of chunks committed by all steps.
    pub fn commit_count(&self) -> usize {
        self.step_executions
            .iter()
            .map(|step| step.commit_count)
            .sum()
    }
}

/// Represents an instance of a job.
///
/// A `JobInstance` is created through the `JobBuilder` and executed by calling
/// the `run` method. The steps are executed in the order they were added.
pub struct JobInstance<'a> {
    /// Unique identifier for this job instance
    id: Uuid,
    /// Human-readable name for the job
    name: String,
    /// Collection of steps that make up this job, in execution order
    steps: Vec<&'a dyn Step>,
}

impl JobInstance<'_> {
    pub fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Job for JobInstance<'_> {
    fn get_name(&self) -> &str {
        &self.name
    }

    /// Runs the job by executing its steps in sequence.
    ///
    /// The first failing step aborts the job; its error is returned unchanged
    /// so that callers can tell malformed input from I/O failures.
    fn run(&self) -> JobResult<JobExecution> {
        let start = Instant::now();

        info!("Start of job: {}, id: {}", self.name, self.id);

        let mut step_executions = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let mut step_execution = StepExecution::new(step.get_name());

            if let Err(err) = step.execute(&mut step_execution) {
                error!(
                    "Job {} aborted by step {}: {}",
                    self.name,
                    step.get_name(),
                    err
                );
                return Err(err);
            }

            step_executions.push(step_execution);
        }

        info!("End of job: {}, id: {}", self.name, self.id);

        Ok(JobExecution {
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            step_executions,
        })
    }
}

/// Builder for creating a job instance.
///
/// # Example
///
/// ```
/// use fruit_batch::{
///     BatchError,
///     core::{
///         job::{Job, JobBuilder},
///         step::{Step, StepExecution, StepStatus},
///     },
/// };
///
/// struct Noop(&'static str);
///
/// impl Step for Noop {
///     fn get_name(&self) -> &str {
///         self.0
///     }
///
///     fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
///         step_execution.status = StepStatus::Success;
///         Ok(())
///     }
/// }
///
/// let read_step = Noop("read");
/// let report_step = Noop("report");
///
/// let job = JobBuilder::new()
///     .name("import-fruits".to_string())
///     .start(&read_step)
///     .next(&report_step)
///     .build();
///
/// let execution = job.run().unwrap();
/// assert_eq!(execution.step_executions.len(), 2);
/// assert_eq!(execution.step_executions[1].name, "report");
/// ```
#[derive(Default)]
pub struct JobBuilder<'a> {
    /// Optional name for the job (generated randomly if not specified)
    name: Option<String>,
    /// Collection of steps to be executed, in order
    steps: Vec<&'a dyn Step>,
}

impl<'a> JobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            steps: Vec::new(),
        }
    }

    pub fn name(mut self, name: String) -> JobBuilder<'a> {
        self.name = Some(name);
        self
    }

    /// Sets the first step of the job.
    ///
    /// This method is semantically identical to `next()` but provides better readability
    /// when constructing the initial step of a job.
    pub fn start(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Adds a step to the job. Steps are executed in the order they are added.
    pub fn next(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Builds a `JobInstance`. If no name has been provided, a random name is generated.
    pub fn build(self) -> JobInstance<'a> {
        JobInstance {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            steps: self.steps,
        }
    }
}
