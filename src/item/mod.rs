#[cfg(feature = "csv")]
/// This module provides a CSV item reader and writer implementation.
pub mod csv;
