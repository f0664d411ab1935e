use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
///
/// Every variant is fatal to the run that raised it: there is no retry or
/// skip policy, so the first error aborts the step and the job.
pub enum BatchError {
    /// A record could not be mapped (wrong field count, bad number, bad encoding).
    #[error("Parse error: {0}")]
    Parse(String),

    /// A resource could not be opened, read, written or flushed.
    #[error("I/O error: {0}")]
    Io(String),

    #[error("ItemProcessor from: {0}")]
    ItemProcessor(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JobRepository: {0}")]
    JobRepository(String),
}

impl BatchError {
    /// Returns `true` for malformed input records.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, BatchError::Parse(_))
    }

    /// Returns `true` for resource failures.
    pub fn is_io_error(&self) -> bool {
        matches!(self, BatchError::Io(_))
    }
}

impl From<io::Error> for BatchError {
    fn from(error: io::Error) -> Self {
        BatchError::Io(error.to_string())
    }
}
