mod common;

use std::{
    error::Error,
    fs, io,
    sync::{Arc, Mutex},
};

use common::{MockFile, config_with_input, fruit_lines, read_output};
use fruit_batch::{
    BatchError,
    config::BatchConfig,
    core::{
        job::JobBuilder,
        launcher::JobLauncher,
        repository::{BatchStatus, InMemoryJobRepository},
        step::StepBuilder,
    },
    fruit::{FRUIT_FIELDS, Fruit, FruitItemProcessor, launch_fruit_job},
    item::csv::{csv_reader::CsvItemReaderBuilder, csv_writer::CsvItemWriterBuilder},
};

#[test]
fn bad_price_should_keep_only_previous_chunks() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let input = format!("{}apple,x\n{}", fruit_lines(14), fruit_lines(5));
    let config = config_with_input(dir.path(), &input)?;
    let repository = InMemoryJobRepository::new();

    let result = launch_fruit_job(&config, &JobLauncher::new(&repository));

    match result {
        Err(BatchError::Parse(message)) => assert!(message.starts_with("line 15:")),
        other => panic!("expected a parse error, got {:?}", other),
    }
    assert_eq!(read_output(&config), fruit_lines(10));

    let run = repository.last_job_execution("testJob").unwrap();
    assert_eq!(run.status, BatchStatus::Failed);
    assert!(run.exit_message.unwrap().starts_with("Parse error: line 15:"));

    Ok(())
}

#[test]
fn bad_price_in_first_chunk_should_write_nothing() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = config_with_input(dir.path(), "apple,100\napple,x\nbanana,200\n")?;
    let repository = InMemoryJobRepository::new();

    let result = launch_fruit_job(&config, &JobLauncher::new(&repository));

    assert!(matches!(result, Err(BatchError::Parse(_))));
    assert_eq!(read_output(&config), "");

    Ok(())
}

#[test]
fn blank_line_should_fail_the_run() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = config_with_input(dir.path(), "apple,100\n\nbanana,200\n")?;
    let repository = InMemoryJobRepository::new();

    let result = launch_fruit_job(&config, &JobLauncher::new(&repository));

    match result {
        Err(BatchError::Parse(message)) => {
            assert_eq!(message, "line 2: expected 2 fields [name, price] but found 0")
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
    assert_eq!(read_output(&config), "");
    assert_eq!(
        repository.last_job_execution("testJob").map(|run| run.status),
        Some(BatchStatus::Failed)
    );

    Ok(())
}

#[test]
fn wrong_field_count_should_fail_the_run() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = config_with_input(dir.path(), "apple,100,red\n")?;
    let repository = InMemoryJobRepository::new();

    let result = launch_fruit_job(&config, &JobLauncher::new(&repository));

    assert!(matches!(result, Err(BatchError::Parse(_))));
    assert_eq!(
        repository.last_job_execution("testJob").map(|run| run.status),
        Some(BatchStatus::Failed)
    );

    Ok(())
}

#[test]
fn failed_run_should_not_prevent_next_run() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = config_with_input(dir.path(), "apple,x\n")?;
    let repository = InMemoryJobRepository::new();
    let launcher = JobLauncher::new(&repository);

    assert!(launch_fruit_job(&config, &launcher).is_err());

    fs::write(&config.input_path, "apple,100\n")?;
    launch_fruit_job(&config, &launcher)?;

    let runs: Vec<(u64, BatchStatus)> = repository
        .find_job_executions("testJob")
        .iter()
        .map(|run| (run.run_id, run.status))
        .collect();
    assert_eq!(
        runs,
        vec![(1, BatchStatus::Failed), (2, BatchStatus::Completed)]
    );
    assert_eq!(read_output(&config), "apple,100\n");

    Ok(())
}

#[test]
fn missing_input_should_be_an_io_error() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = BatchConfig {
        input_path: dir.path().join("missing.csv"),
        output_path: dir.path().join("done.csv"),
        ..BatchConfig::default()
    };
    let repository = InMemoryJobRepository::new();

    let result = launch_fruit_job(&config, &JobLauncher::new(&repository));

    assert!(matches!(result, Err(BatchError::Io(_))));
    assert!(repository.find_job_executions("testJob").is_empty());

    Ok(())
}

#[test]
fn unopenable_output_should_be_an_io_error() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = BatchConfig {
        output_path: dir.path().join("no-such-dir").join("done.csv"),
        ..config_with_input(dir.path(), "apple,100\n")?
    };
    let repository = InMemoryJobRepository::new();

    let result = launch_fruit_job(&config, &JobLauncher::new(&repository));

    assert!(matches!(result, Err(BatchError::Io(_))));

    Ok(())
}

#[test]
fn invalid_config_should_be_rejected_before_running() {
    let config = BatchConfig {
        chunk_size: 0,
        ..BatchConfig::default()
    };
    let repository = InMemoryJobRepository::new();

    let result = launch_fruit_job(&config, &JobLauncher::new(&repository));

    assert!(matches!(result, Err(BatchError::Configuration(_))));
    assert!(repository.job_names().is_empty());
}

#[test]
fn write_failure_should_fail_the_run() {
    let reader = CsvItemReaderBuilder::new()
        .names(&FRUIT_FIELDS)
        .from_reader("apple,100\nbanana,200\n".as_bytes());
    let processor = FruitItemProcessor;

    let mut file = MockFile::default();
    file.expect_write()
        .returning(|_| Err(io::Error::other("disk full")));
    file.expect_flush().returning(|| Ok(()));
    let writer = CsvItemWriterBuilder::new().from_writer(file);

    let step = StepBuilder::<Fruit, Fruit>::new("step1")
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(10)
        .build()
        .unwrap();
    let job = JobBuilder::new()
        .name("testJob".to_string())
        .start(&step)
        .build();

    let repository = InMemoryJobRepository::new();
    let result = JobLauncher::new(&repository).run(&job);

    assert!(matches!(result, Err(BatchError::Io(_))));
    let run = repository.last_job_execution("testJob").unwrap();
    assert_eq!(run.status, BatchStatus::Failed);
    assert!(run.exit_message.unwrap().contains("disk full"));
}

#[test]
fn failed_chunk_should_not_be_written_once_the_sink_recovers() {
    let input = fruit_lines(12);
    let reader = CsvItemReaderBuilder::new()
        .names(&FRUIT_FIELDS)
        .from_reader(input.as_bytes());
    let processor = FruitItemProcessor;

    // first chunk goes through, the second one fails, later writes succeed
    let written = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&written);
    let mut calls = 0;
    let mut file = MockFile::default();
    file.expect_write().returning(move |buf| {
        calls += 1;
        if calls == 2 {
            return Err(io::Error::other("disk full"));
        }
        sink.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    });
    file.expect_flush().returning(|| Ok(()));
    let writer = CsvItemWriterBuilder::new().from_writer(file);

    let step = StepBuilder::<Fruit, Fruit>::new("step1")
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(10)
        .build()
        .unwrap();
    let job = JobBuilder::new()
        .name("testJob".to_string())
        .start(&step)
        .build();

    let repository = InMemoryJobRepository::new();
    let result = JobLauncher::new(&repository).run(&job);
    drop(job);
    drop(step);
    drop(writer);

    assert!(matches!(result, Err(BatchError::Io(_))));
    assert_eq!(
        repository.last_job_execution("testJob").map(|run| run.status),
        Some(BatchStatus::Failed)
    );
    let written = String::from_utf8(written.lock().unwrap().clone()).unwrap();
    assert_eq!(written, fruit_lines(10));
}
