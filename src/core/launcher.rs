use log::{error, info};

use super::{
    job::{Job, JobExecution, JobResult},
    repository::{BatchStatus, InMemoryJobRepository},
};

/// Runs jobs and records every run in a job repository.
///
/// Each call to [`JobLauncher::run`] gets a fresh run id, so launching the
/// same job twice never collides in the ledger. There is no retry or restart:
/// a failed run stays failed.
pub struct JobLauncher<'a> {
    repository: &'a InMemoryJobRepository,
}

impl<'a> JobLauncher<'a> {
    pub fn new(repository: &'a InMemoryJobRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &'a InMemoryJobRepository {
        self.repository
    }

    pub fn run(&self, job: &dyn Job) -> JobResult<JobExecution> {
        let record = self.repository.create_job_execution(job.get_name());
        self.repository
            .update_status(record.run_id, BatchStatus::Running, None)?;

        info!(
            "Job: [name={}] launched with run.id: {}",
            record.job_name, record.run_id
        );

        match job.run() {
            Ok(execution) => {
                self.repository
                    .update_status(record.run_id, BatchStatus::Completed, None)?;
                info!(
                    "Job: [name={}, run.id={}] completed in {:?}",
                    record.job_name, record.run_id, execution.duration
                );
                Ok(execution)
            }
            Err(err) => {
                self.repository.update_status(
                    record.run_id,
                    BatchStatus::Failed,
                    Some(err.to_string()),
                )?;
                error!(
                    "Job: [name={}, run.id={}] failed: {}",
                    record.job_name, record.run_id, err
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use crate::{
        BatchError,
        core::{
            job::{Job, JobExecution, JobResult},
            repository::{BatchStatus, InMemoryJobRepository},
        },
    };

    use super::JobLauncher;

    struct StubJob {
        fail: bool,
    }

    impl Job for StubJob {
        fn get_name(&self) -> &str {
            "testJob"
        }

        fn run(&self) -> JobResult<JobExecution> {
            if self.fail {
                return Err(BatchError::Io("done.csv: permission denied".to_string()));
            }
            let start = Instant::now();
            Ok(JobExecution {
                start,
                end: start,
                duration: start.elapsed(),
                step_executions: Vec::new(),
            })
        }
    }

    #[test]
    fn successful_run_should_be_recorded_as_completed() {
        let repository = InMemoryJobRepository::new();
        let launcher = JobLauncher::new(&repository);

        let result = launcher.run(&StubJob { fail: false });

        assert!(result.is_ok());
        let record = repository.last_job_execution("testJob").unwrap();
        assert_eq!(record.run_id, 1);
        assert_eq!(record.status, BatchStatus::Completed);
        assert!(record.start_time.is_some());
        assert!(record.end_time.is_some());
        assert!(record.exit_message.is_none());
    }

    #[test]
    fn failed_run_should_be_recorded_with_its_error() {
        let repository = InMemoryJobRepository::new();
        let launcher = JobLauncher::new(&repository);

        let result = launcher.run(&StubJob { fail: true });

        assert!(matches!(result, Err(BatchError::Io(_))));
        let record = repository.last_job_execution("testJob").unwrap();
        assert_eq!(record.status, BatchStatus::Failed);
        assert_eq!(
            record.exit_message.as_deref(),
            Some("I/O error: done.csv: permission denied")
        );
    }

    #[test]
    fn every_launch_should_get_a_new_run_id() {
        let repository = InMemoryJobRepository::new();
        let launcher = JobLauncher::new(&repository);

        launcher.run(&StubJob { fail: false }).unwrap();
        let _ = launcher.run(&StubJob { fail: true });
        launcher.run(&StubJob { fail: false }).unwrap();

        let statuses: Vec<(u64, BatchStatus)> = launcher
            .repository()
            .find_job_executions("testJob")
            .iter()
            .map(|record| (record.run_id, record.status))
            .collect();

        assert_eq!(
            statuses,
            vec![
                (1, BatchStatus::Completed),
                (2, BatchStatus::Failed),
                (3, BatchStatus::Completed),
            ]
        );
    }
}
