//! CSV support for reading and writing tabular data.
//!
//! 1. **CsvItemReader**: deserializes CSV lines into Rust structs with serde,
//!    mapping columns by name or by position.
//!
//! 2. **CsvItemWriter**: serializes Rust structs into CSV lines, optionally
//!    appending to an existing file.
//!
//! Both components follow the builder pattern and implement the `ItemReader`
//! and `ItemWriter` traits, so they can be plugged into a chunk-oriented step.
//!
//! # Example
//!
//! ```
//! use fruit_batch::core::item::{ItemReader, ItemWriter};
//! use fruit_batch::item::csv::csv_reader::CsvItemReaderBuilder;
//! use fruit_batch::item::csv::csv_writer::CsvItemWriterBuilder;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Deserialize, Serialize)]
//! struct Fruit {
//!     name: String,
//!     price: i32,
//! }
//!
//! let reader = CsvItemReaderBuilder::new()
//!     .names(&["name", "price"])
//!     .from_reader("apple,100\nbanana,200\n".as_bytes());
//!
//! let mut fruits: Vec<Fruit> = Vec::new();
//! while let Some(fruit) = reader.read().unwrap() {
//!     fruits.push(fruit);
//! }
//!
//! let writer = CsvItemWriterBuilder::new().from_writer(vec![]);
//! writer.write(&fruits).unwrap();
//!
//! let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
//! assert_eq!(output, "apple,100\nbanana,200\n");
//! ```

/// A module providing facilities for reading CSV data records.
pub mod csv_reader;

/// A module providing facilities for writing CSV data records.
pub mod csv_writer;
