#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Fruit batch

 A small chunk-oriented batch toolkit and the job built on it: fruit records
 are read from a headerless CSV file, passed through a processor, and appended
 to another CSV file ten at a time. Job runs are recorded in an in-memory job
 repository that disappears with the process.

 ## Core Concepts

- **Job:** the entire batch process, composed of one or more `Step`s run in order.
- **Step:** reads items one at a time, processes them, and writes them chunk by chunk.
- **ItemReader:** retrieval of input for a `Step`, one item at a time.
- **ItemProcessor:** business logic applied to every item read.
- **ItemWriter:** output of a `Step`, one chunk of items at a time, flushed after each chunk.
- **JobLauncher:** runs a job and records the run (run id, status) in the `InMemoryJobRepository`.

 There is no retry, skip or restart: the first malformed line or I/O failure
 fails the run, and chunks flushed before the failure stay written.

 ## Getting Started

```rust
# use fruit_batch::{
#     config::BatchConfig,
#     core::{launcher::JobLauncher, repository::{BatchStatus, InMemoryJobRepository}},
#     error::BatchError,
#     fruit::launch_fruit_job,
# };
fn main() -> Result<(), BatchError> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("sample.csv");
    std::fs::write(&input, "apple,100\nbanana,200\n")?;

    let config = BatchConfig {
        input_path: input,
        output_path: dir.path().join("done.csv"),
        ..BatchConfig::default()
    };

    let repository = InMemoryJobRepository::new();
    let launcher = JobLauncher::new(&repository);

    let execution = launch_fruit_job(&config, &launcher)?;
    assert_eq!(execution.write_count(), 2);

    let run = repository.last_job_execution("testJob").unwrap();
    assert_eq!(run.status, BatchStatus::Completed);
    assert_eq!(
        std::fs::read_to_string(&config.output_path)?,
        "apple,100\nbanana,200\n"
    );

    Ok(())
}
```
 */

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Job configuration
pub mod config;

#[cfg(feature = "csv")]
/// The fruit record, its processor and the job wiring
pub mod fruit;

/// Set of items readers / writers
pub mod item;
