use csv::{ReaderBuilder, StringRecord, Terminator, Trim};
use serde::de::DeserializeOwned;
use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
};

/// A CSV item reader that implements the `ItemReader` trait.
///
/// This reader deserializes CSV data into Rust structs row by row
/// using Serde's deserialization capabilities. It can process CSV
/// data from files, strings, or any source implementing the `Read` trait.
///
/// Every physical line is one record, so a quoted field cannot span lines.
/// Lines starting with the comment prefix (`#` by default) are skipped. Any
/// other line, an empty one included, must hold a record.
///
/// Fields are mapped onto the target type by name when names are known
/// (configured with [`CsvItemReaderBuilder::names`] or taken from a header
/// row) and by position otherwise.
///
/// The reader only moves forward. Reading the input again means building a
/// new reader, which starts from the first line.
///
/// # Errors
///
/// - `BatchError::Parse` when a line has the wrong number of fields or a field
///   cannot be converted to its target type. The message carries the line number.
/// - `BatchError::Io` when the underlying source cannot be read.
///
/// # Examples
///
/// ```
/// use fruit_batch::item::csv::csv_reader::CsvItemReaderBuilder;
/// use fruit_batch::core::item::ItemReader;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Record {
///     name: String,
///     value: i32,
/// }
///
/// let data = "\
/// ## name,value
/// foo,123
/// bar,456
/// ";
///
/// let reader = CsvItemReaderBuilder::new()
///     .names(&["name", "value"])
///     .from_reader(data.as_bytes());
///
/// let record: Record = reader.read().unwrap().unwrap();
/// assert_eq!(record.name, "foo");
/// assert_eq!(record.value, 123);
///
/// let record: Record = reader.read().unwrap().unwrap();
/// assert_eq!(record.name, "bar");
/// assert_eq!(record.value, 456);
///
/// assert!(ItemReader::<Record>::read(&reader).unwrap().is_none());
/// ```
pub struct CsvItemReader<R> {
    /// Source, consumed one line at a time
    ///
    /// Uses `RefCell` to provide interior mutability so we can advance
    /// through the input while keeping the `read` method signature compatible
    /// with the `ItemReader` trait.
    source: RefCell<BufReader<R>>,
    /// Number of the last line taken from the source, starting at 1
    line: Cell<u64>,
    /// Splits a single line into fields
    tokenizer: ReaderBuilder,
    terminator: Terminator,
    comment: Option<u8>,
    /// Field names, in column order
    names: Option<StringRecord>,
}

impl<R: Read, T: DeserializeOwned> ItemReader<T> for CsvItemReader<R> {
    /// Reads the next item from the CSV source.
    ///
    /// # Returns
    /// - `Ok(Some(record))` if a record is successfully read
    /// - `Ok(None)` if there are no more records to read
    /// - `Err(BatchError)` if the line is malformed or the source is unreadable
    fn read(&self) -> ItemReaderResult<T> {
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };

        let string_record = self.tokenize(&line)?;

        if let Some(names) = &self.names {
            if string_record.len() != names.len() {
                return Err(BatchError::Parse(format!(
                    "line {}: expected {} fields [{}] but found {}",
                    self.line.get(),
                    names.len(),
                    names.iter().collect::<Vec<_>>().join(", "),
                    string_record.len()
                )));
            }
        }

        string_record
            .deserialize(self.names.as_ref())
            .map(Some)
            .map_err(|error| BatchError::Parse(format!("line {}: {}", self.line.get(), error)))
    }
}

impl<R: Read> CsvItemReader<R> {
    /// Returns the next line that is not a comment, without its terminator.
    fn next_line(&self) -> Result<Option<Vec<u8>>, BatchError> {
        let end = match self.terminator {
            Terminator::Any(byte) => byte,
            _ => b'\n',
        };

        let mut source = self.source.borrow_mut();
        loop {
            let mut line = Vec::new();
            if source.read_until(end, &mut line)? == 0 {
                return Ok(None);
            }
            self.line.set(self.line.get() + 1);

            if line.last() == Some(&end) {
                line.pop();
            }
            if matches!(self.terminator, Terminator::CRLF) && line.last() == Some(&b'\r') {
                line.pop();
            }

            match (self.comment, line.first()) {
                (Some(prefix), Some(first)) if prefix == *first => continue,
                _ => return Ok(Some(line)),
            }
        }
    }

    /// An empty line yields a record without fields.
    fn tokenize(&self, line: &[u8]) -> Result<StringRecord, BatchError> {
        match self.tokenizer.from_reader(line).into_records().next() {
            Some(record) => record.map_err(|error| {
                BatchError::Parse(format!("line {}: {}", self.line.get(), error))
            }),
            None => Ok(StringRecord::new()),
        }
    }
}

/// A builder for configuring CSV item reading.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Terminator: CRLF (`\n` or `\r\n`)
/// - Comment prefix: `#`
/// - Headers: disabled
/// - Names: none (positional mapping)
/// - Trimming: All fields trimmed
pub struct CsvItemReaderBuilder {
    /// The delimiter character (default: comma ',')
    delimiter: u8,
    /// The line terminator (default: CRLF)
    terminator: Terminator,
    /// Lines starting with this byte are skipped (default: '#')
    comment: Option<u8>,
    /// Whether the CSV has headers (default: false)
    has_headers: bool,
    /// Field names used to map columns
    names: Option<Vec<String>>,
}

impl Default for CsvItemReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvItemReaderBuilder {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            terminator: Terminator::CRLF,
            comment: Some(b'#'),
            has_headers: false,
            names: None,
        }
    }

    /// Sets the delimiter character for the CSV parsing.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the line terminator for the CSV parsing.
    ///
    /// - `Terminator::CRLF`: `\n`, with an optional `\r` before it (default)
    /// - `Terminator::Any(byte)`: custom terminator
    pub fn terminator(mut self, terminator: Terminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Sets the prefix of comment lines, or `None` to read every line.
    pub fn comment(mut self, comment: Option<u8>) -> Self {
        self.comment = comment;
        self
    }

    /// Sets whether the first row holds column names.
    ///
    /// The header row is never returned as an item. Unless [`names`](Self::names)
    /// is also set, its values are used to map columns onto fields.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Declares the name of every column, in order.
    ///
    /// Every line must then have exactly as many fields as there are names.
    ///
    /// ```
    /// use fruit_batch::item::csv::csv_reader::CsvItemReaderBuilder;
    ///
    /// let builder = CsvItemReaderBuilder::new().names(&["name", "price"]);
    /// ```
    pub fn names(mut self, names: &[&str]) -> Self {
        self.names = Some(names.iter().map(|name| name.to_string()).collect());
        self
    }

    /// Creates a `CsvItemReader` from any source implementing `Read`.
    pub fn from_reader<R: Read>(self, rdr: R) -> CsvItemReader<R> {
        let mut tokenizer = ReaderBuilder::new();
        tokenizer
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .terminator(self.terminator)
            .has_headers(false)
            // field counts are checked against the names in `read`
            .flexible(true)
            .buffer_capacity(1024);

        let mut reader = CsvItemReader {
            source: RefCell::new(BufReader::new(rdr)),
            line: Cell::new(0),
            tokenizer,
            terminator: self.terminator,
            comment: self.comment,
            names: self.names.map(StringRecord::from),
        };

        if self.has_headers {
            let header = reader
                .next_line()
                .ok()
                .flatten()
                .and_then(|line| reader.tokenize(&line).ok());
            if reader.names.is_none() {
                reader.names = header;
            }
        }

        reader
    }

    /// Creates a `CsvItemReader` from a file path.
    ///
    /// # Errors
    /// Returns `BatchError::Io` if the file cannot be opened.
    ///
    /// ```no_run
    /// use fruit_batch::item::csv::csv_reader::CsvItemReaderBuilder;
    ///
    /// let reader = CsvItemReaderBuilder::new()
    ///     .names(&["name", "price"])
    ///     .from_path("resources/sample.csv")
    ///     .unwrap();
    /// ```
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvItemReader<File>, BatchError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|error| BatchError::Io(format!("{}: {}", path.display(), error)))?;

        Ok(self.from_reader(file))
    }
}
