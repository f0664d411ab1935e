use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    BatchError,
    config::BatchConfig,
    core::{
        item::{ItemProcessor, ItemProcessorResult},
        job::{JobBuilder, JobExecution},
        launcher::JobLauncher,
        step::StepBuilder,
    },
    item::csv::{csv_reader::CsvItemReaderBuilder, csv_writer::CsvItemWriterBuilder},
};

/// Column names of the fruit files, in order.
pub const FRUIT_FIELDS: [&str; 2] = ["name", "price"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Fruit {
    pub name: String,
    pub price: i32,
}

impl Fruit {
    pub fn new(name: &str, price: i32) -> Self {
        Self {
            name: name.to_owned(),
            price,
        }
    }
}

impl fmt::Display for Fruit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name:{}, price:{}", self.name, self.price)
    }
}

/// Per-fruit transformation applied between reading and writing.
///
/// Fruits currently pass through unchanged.
#[derive(Default)]
pub struct FruitItemProcessor;

impl ItemProcessor<Fruit, Fruit> for FruitItemProcessor {
    fn process(&self, item: &Fruit) -> ItemProcessorResult<Fruit> {
        Ok(item.clone())
    }
}

/// Builds the fruit job from `config` and runs it through `launcher`.
///
/// Reader and writer are created for this launch only, so every launch reads
/// the input from its first line. Output lines are appended, never replaced.
///
/// # Errors
/// - `BatchError::Configuration` for an invalid `config`
/// - `BatchError::Io` when the input or output cannot be opened (the run is
///   not registered in that case) or written
/// - `BatchError::Parse` for the first malformed input line
pub fn launch_fruit_job(
    config: &BatchConfig,
    launcher: &JobLauncher,
) -> Result<JobExecution, BatchError> {
    config.validate()?;

    info!(
        "Wiring job {}: {} -> {}",
        config.job_name,
        config.input_path.display(),
        config.output_path.display()
    );

    let reader = CsvItemReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(false)
        .names(&FRUIT_FIELDS)
        .from_path(&config.input_path)?;

    let processor = FruitItemProcessor;

    let writer = CsvItemWriterBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(false)
        .append(true)
        .from_path(&config.output_path)?;

    let step = StepBuilder::<Fruit, Fruit>::new(&config.step_name)
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(config.chunk_size)
        .build()?;

    let job = JobBuilder::new()
        .name(config.job_name.clone())
        .start(&step)
        .build();

    launcher.run(&job)
}

#[cfg(test)]
mod tests {
    use crate::core::item::ItemProcessor;

    use super::{Fruit, FruitItemProcessor};

    #[test]
    fn processor_should_leave_fruit_unchanged() {
        let apple = Fruit::new("apple", 100);

        let processed = FruitItemProcessor.process(&apple).unwrap();

        assert_eq!(processed, apple);
    }

    #[test]
    fn fruit_should_display_its_fields() {
        assert_eq!(Fruit::new("banana", 200).to_string(), "name:banana, price:200");
    }
}
