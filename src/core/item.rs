use crate::error::BatchError;

/// Result of a single read: `Ok(None)` marks the clean end of the input.
pub type ItemReaderResult<I> = Result<Option<I>, BatchError>;

/// Result of processing a single item.
pub type ItemProcessorResult<O> = Result<O, BatchError>;

/// Result of writing or flushing a chunk.
pub type ItemWriterResult = Result<(), BatchError>;

/// Retrieves the input of a step, one item at a time.
pub trait ItemReader<I> {
    /// Reads the next item.
    ///
    /// # Returns
    /// - `Ok(Some(item))` when an item was read
    /// - `Ok(None)` when the input is exhausted
    /// - `Err(BatchError)` when the input is unreadable or malformed
    fn read(&self) -> ItemReaderResult<I>;
}

/// Business logic applied to every item between the reader and the writer.
///
/// Implementations must be free of side effects: the step calls `process`
/// exactly once per item, in input order.
pub trait ItemProcessor<I, O> {
    fn process(&self, item: &I) -> ItemProcessorResult<O>;
}

/// Output of a step, one chunk at a time.
pub trait ItemWriter<O> {
    /// Writes every item of a chunk, in order.
    fn write(&self, items: &[O]) -> ItemWriterResult;

    /// Makes the items written so far durable. Called once per chunk.
    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    /// Called once before the first chunk.
    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    /// Called once after the last chunk, whether the step succeeded or not.
    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}
