use std::time::{Duration, Instant};

use log::{debug, error, info};
use uuid::Uuid;

use crate::BatchError;

use super::{
    chunk::{Chunk, ChunkStatus},
    item::{ItemProcessor, ItemReader, ItemWriter},
};

/// Default commit interval of a chunk-oriented step.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum StepStatus {
    Starting,
    Started,
    Success,
    ReadError,
    ProcessorError,
    WriteError,
}

/// Execution details of one step.
#[derive(Debug, Clone)]
pub struct StepExecution {
    /// Unique identifier for this step execution
    pub id: Uuid,
    /// Human-readable name for the step
    pub name: String,
    /// Current status of the step execution
    pub status: StepStatus,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
    pub duration: Option<Duration>,
    /// Number of items successfully read
    pub read_count: usize,
    /// Number of items successfully written and flushed
    pub write_count: usize,
    /// Number of chunks written and flushed
    pub commit_count: usize,
    /// Number of errors encountered during reading
    pub read_error_count: usize,
    /// Number of errors encountered during processing
    pub process_error_count: usize,
    /// Number of errors encountered during writing
    pub write_error_count: usize,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            status: StepStatus::Starting,
            start_time: None,
            end_time: None,
            duration: None,
            read_count: 0,
            write_count: 0,
            commit_count: 0,
            read_error_count: 0,
            process_error_count: 0,
            write_error_count: 0,
        }
    }
}

pub trait Step {
    fn get_name(&self) -> &str;

    /// Executes the step, recording progress into `step_execution`.
    ///
    /// # Returns
    /// - `Ok(())`: every item was read, processed and written
    /// - `Err(BatchError)`: the first error met; items of earlier chunks stay written
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError>;
}

/// Step reading items one by one and writing them chunk by chunk.
///
/// There is no fault tolerance: the first read, process or write error fails
/// the step. Items read into a chunk that never reaches the writer are
/// discarded, chunks already flushed are not rolled back.
pub struct ChunkOrientedStep<'a, I, O> {
    name: String,
    /// Component responsible for reading items from the source
    reader: &'a dyn ItemReader<I>,
    /// Component responsible for processing items
    processor: &'a dyn ItemProcessor<I, O>,
    /// Component responsible for writing items to the destination
    writer: &'a dyn ItemWriter<O>,
    /// Number of items to process in each chunk
    chunk_size: usize,
}

impl<I, O> Step for ChunkOrientedStep<'_, I, O> {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        let start_time = Instant::now();
        step_execution.start_time = Some(start_time);
        step_execution.status = StepStatus::Started;

        info!(
            "Start of step: {}, id: {}",
            step_execution.name, step_execution.id
        );

        let result = match self.writer.open() {
            Ok(()) => self.execute_chunks(step_execution),
            Err(err) => {
                step_execution.status = StepStatus::WriteError;
                Err(err)
            }
        };

        let result = match (result, self.writer.close()) {
            (Ok(()), Err(err)) => {
                step_execution.status = StepStatus::WriteError;
                Err(err)
            }
            (result, Err(err)) => {
                error!("ItemWriter close error: {}", err);
                result
            }
            (result, Ok(())) => result,
        };

        step_execution.end_time = Some(Instant::now());
        step_execution.duration = Some(start_time.elapsed());

        match &result {
            Ok(()) => info!(
                "End of step: {}, id: {}, read: {}, written: {}, commits: {}",
                step_execution.name,
                step_execution.id,
                step_execution.read_count,
                step_execution.write_count,
                step_execution.commit_count
            ),
            Err(err) => error!(
                "Step {} failed with status {:?}: {}",
                step_execution.name, step_execution.status, err
            ),
        }

        result
    }
}

impl<I, O> ChunkOrientedStep<'_, I, O> {
    fn execute_chunks(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        loop {
            let (chunk, chunk_status) = match self.read_chunk(step_execution) {
                Ok(read) => read,
                Err(err) => {
                    step_execution.status = StepStatus::ReadError;
                    return Err(err);
                }
            };

            if !chunk.is_empty() {
                let processed_items = match self.process_chunk(step_execution, chunk.items()) {
                    Ok(items) => items,
                    Err(err) => {
                        step_execution.status = StepStatus::ProcessorError;
                        return Err(err);
                    }
                };

                if let Err(err) = self.write_chunk(step_execution, &processed_items) {
                    step_execution.status = StepStatus::WriteError;
                    return Err(err);
                }
            }

            if chunk_status == ChunkStatus::Finished {
                step_execution.status = StepStatus::Success;
                return Ok(());
            }
        }
    }

    fn read_chunk(
        &self,
        step_execution: &mut StepExecution,
    ) -> Result<(Chunk<I>, ChunkStatus), BatchError> {
        debug!("Start reading chunk");

        let mut chunk = Chunk::new(self.chunk_size);

        loop {
            match self.reader.read() {
                Ok(Some(item)) => {
                    chunk.push(item);
                    step_execution.read_count += 1;

                    if chunk.is_full() {
                        debug!("End reading chunk: FULL");
                        return Ok((chunk, ChunkStatus::Full));
                    }
                }
                Ok(None) => {
                    debug!("End reading chunk: FINISHED");
                    return Ok((chunk, ChunkStatus::Finished));
                }
                Err(err) => {
                    step_execution.read_error_count += 1;
                    error!("Error occurred during read item: {}", err);
                    return Err(err);
                }
            }
        }
    }

    fn process_chunk(
        &self,
        step_execution: &mut StepExecution,
        read_items: &[I],
    ) -> Result<Vec<O>, BatchError> {
        debug!("Start processing chunk");

        let mut processed_items = Vec::with_capacity(read_items.len());
        for item in read_items {
            match self.processor.process(item) {
                Ok(processed) => processed_items.push(processed),
                Err(err) => {
                    step_execution.process_error_count += 1;
                    error!("Error occurred during process item: {}", err);
                    return Err(err);
                }
            }
        }

        debug!("End processing chunk");
        Ok(processed_items)
    }

    fn write_chunk(
        &self,
        step_execution: &mut StepExecution,
        processed_items: &[O],
    ) -> Result<(), BatchError> {
        debug!("Start writing chunk of {} items", processed_items.len());

        let result = self
            .writer
            .write(processed_items)
            .and_then(|()| self.writer.flush());

        match result {
            Ok(()) => {
                step_execution.write_count += processed_items.len();
                step_execution.commit_count += 1;
                debug!("End writing chunk");
                Ok(())
            }
            Err(err) => {
                step_execution.write_error_count += processed_items.len();
                error!("ItemWriter error: {}", err);
                Err(err)
            }
        }
    }
}

/// Builder of a [`ChunkOrientedStep`].
///
/// ```
/// # use fruit_batch::core::item::{ItemProcessor, ItemProcessorResult, ItemReader, ItemReaderResult, ItemWriter, ItemWriterResult};
/// # use fruit_batch::core::step::{Step, StepBuilder, StepExecution};
/// # use std::cell::RefCell;
/// struct Countdown(RefCell<u32>);
/// impl ItemReader<u32> for Countdown {
///     fn read(&self) -> ItemReaderResult<u32> {
///         let mut left = self.0.borrow_mut();
///         if *left == 0 { return Ok(None); }
///         *left -= 1;
///         Ok(Some(*left))
///     }
/// }
/// struct Double;
/// impl ItemProcessor<u32, u32> for Double {
///     fn process(&self, item: &u32) -> ItemProcessorResult<u32> { Ok(item * 2) }
/// }
/// #[derive(Default)]
/// struct Collect(RefCell<Vec<u32>>);
/// impl ItemWriter<u32> for Collect {
///     fn write(&self, items: &[u32]) -> ItemWriterResult {
///         self.0.borrow_mut().extend_from_slice(items);
///         Ok(())
///     }
/// }
///
/// let reader = Countdown(RefCell::new(3));
/// let writer = Collect::default();
/// let step = StepBuilder::new("double")
///     .reader(&reader)
///     .processor(&Double)
///     .writer(&writer)
///     .chunk(2)
///     .build()
///     .unwrap();
///
/// let mut execution = StepExecution::new(step.get_name());
/// step.execute(&mut execution).unwrap();
/// assert_eq!(*writer.0.borrow(), vec![4, 2, 0]);
/// assert_eq!(execution.commit_count, 2);
/// ```
pub struct StepBuilder<'a, I, O> {
    name: String,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ItemWriter<O>>,
    chunk_size: usize,
}

impl<'a, I, O> StepBuilder<'a, I, O> {
    pub fn new(name: &str) -> StepBuilder<'a, I, O> {
        Self {
            name: name.to_owned(),
            reader: None,
            processor: None,
            writer: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn reader(mut self, reader: &'a impl ItemReader<I>) -> StepBuilder<'a, I, O> {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a impl ItemProcessor<I, O>) -> StepBuilder<'a, I, O> {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a impl ItemWriter<O>) -> StepBuilder<'a, I, O> {
        self.writer = Some(writer);
        self
    }

    /// Sets the commit interval. A size of 0 is treated as 1.
    pub fn chunk(mut self, chunk_size: usize) -> StepBuilder<'a, I, O> {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn build(self) -> Result<ChunkOrientedStep<'a, I, O>, BatchError> {
        let missing = |component: &str| {
            BatchError::Configuration(format!("step {} has no {}", self.name, component))
        };

        Ok(ChunkOrientedStep {
            reader: self.reader.ok_or_else(|| missing("reader"))?,
            processor: self.processor.ok_or_else(|| missing("processor"))?,
            writer: self.writer.ok_or_else(|| missing("writer"))?,
            chunk_size: self.chunk_size,
            name: self.name,
        })
    }
}
