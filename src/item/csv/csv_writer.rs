use std::{
    cell::{Cell, RefCell},
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    rc::Rc,
};

use csv::{Terminator, Writer, WriterBuilder};
use serde::Serialize;

use crate::{
    BatchError,
    core::item::{ItemWriter, ItemWriterResult},
};

/// A CSV item writer that implements the `ItemWriter` trait.
///
/// Every item becomes one line, fields in declaration order, terminated by
/// `\n`. Lines are buffered until [`ItemWriter::flush`] is called, which the
/// step does once per chunk.
///
/// Once a write or a flush has failed, nothing more reaches the underlying
/// writer: lines still buffered are dropped by `close` and on drop, so a
/// failed chunk is never written.
pub struct CsvItemWriter<T: Write> {
    wrapper: RefCell<Writer<Sink<T>>>,
    failed: Rc<Cell<bool>>,
}

impl<T: Write, R: Serialize> ItemWriter<R> for CsvItemWriter<T> {
    fn write(&self, items: &[R]) -> ItemWriterResult {
        let mut wrapper = self.wrapper.borrow_mut();
        for item in items {
            wrapper.serialize(item).map_err(|error| {
                self.failed.set(true);
                BatchError::Io(error.to_string())
            })?;
        }
        Ok(())
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    ///
    /// If there was a problem writing to the underlying writer, then an error
    /// is returned.
    ///
    /// Note that this also flushes the underlying writer.
    fn flush(&self) -> ItemWriterResult {
        self.wrapper.borrow_mut().flush().map_err(|error| {
            self.failed.set(true);
            BatchError::from(error)
        })
    }

    /// Flushes what is left, or discards it after a failure.
    fn close(&self) -> ItemWriterResult {
        if self.failed.get() {
            // the sink swallows the buffer
            let _ = self.wrapper.borrow_mut().flush();
            return Ok(());
        }
        ItemWriter::<R>::flush(self)
    }
}

impl<T: Write> CsvItemWriter<T> {
    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<T, BatchError> {
        self.wrapper
            .into_inner()
            .into_inner()
            .map(|sink| sink.inner)
            .map_err(|error| BatchError::Io(error.to_string()))
    }

    /// Whether a write or a flush has failed.
    pub fn has_failed(&self) -> bool {
        self.failed.get()
    }
}

/// Passes bytes through to `inner` until the owning writer fails.
struct Sink<T> {
    inner: T,
    failed: Rc<Cell<bool>>,
}

impl<T: Write> Write for Sink<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failed.get() {
            return Ok(buf.len());
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.failed.get() {
            return Ok(());
        }
        self.inner.flush()
    }
}

/// A builder for configuring CSV item writing.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Headers: disabled
/// - Append: disabled (an existing file is truncated)
pub struct CsvItemWriterBuilder {
    delimiter: u8,
    has_headers: bool,
    append: bool,
}

impl Default for CsvItemWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvItemWriterBuilder {
    pub fn new() -> CsvItemWriterBuilder {
        CsvItemWriterBuilder {
            delimiter: b',',
            has_headers: false,
            append: false,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> CsvItemWriterBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Writes a header row built from the field names of the first item.
    ///
    /// When appending, the header row is only written if the file is empty.
    pub fn has_headers(mut self, yes: bool) -> CsvItemWriterBuilder {
        self.has_headers = yes;
        self
    }

    /// Keeps the existing content of the file and adds lines after it.
    pub fn append(mut self, yes: bool) -> CsvItemWriterBuilder {
        self.append = yes;
        self
    }

    /// Opens (or creates) the file at `path`.
    ///
    /// # Errors
    /// Returns `BatchError::Io` if the file cannot be opened or created.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvItemWriter<File>, BatchError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(path)
            .map_err(|error| BatchError::Io(format!("{}: {}", path.display(), error)))?;

        let is_empty = file.metadata()?.len() == 0;
        Ok(self.build(file, is_empty))
    }

    /// Serialize records into any `Write` implementation.
    ///
    /// ```
    /// # use std::error::Error;
    /// # use fruit_batch::{item::csv::csv_writer::CsvItemWriterBuilder, core::item::ItemWriter};
    /// #[derive(serde::Serialize)]
    /// struct Row<'a> {
    ///     name: &'a str,
    ///     price: i32,
    /// }
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let wtr = CsvItemWriterBuilder::new().from_writer(vec![]);
    ///
    ///     wtr.write(&[
    ///         Row { name: "apple", price: 100 },
    ///         Row { name: "banana", price: 200 },
    ///     ])?;
    ///
    ///     let data = String::from_utf8(wtr.into_inner()?)?;
    ///     assert_eq!(data, "apple,100\nbanana,200\n");
    ///     Ok(())
    /// }
    /// ```
    pub fn from_writer<W: Write>(self, wtr: W) -> CsvItemWriter<W> {
        self.build(wtr, true)
    }

    fn build<W: Write>(self, wtr: W, is_empty: bool) -> CsvItemWriter<W> {
        let failed = Rc::new(Cell::new(false));
        let sink = Sink {
            inner: wtr,
            failed: Rc::clone(&failed),
        };
        let wtr = WriterBuilder::new()
            .flexible(false)
            .delimiter(self.delimiter)
            .terminator(Terminator::Any(b'\n'))
            .has_headers(self.has_headers && is_empty)
            .from_writer(sink);

        CsvItemWriter {
            wrapper: RefCell::new(wtr),
            failed,
        }
    }
}
