//! Delimited flat-file support for Ferry
//!
//! Reads and writes CSV-style files with a configurable single-byte
//! delimiter and an optional header row. All functions here are blocking;
//! async callers should run them on a blocking thread.

mod reader;
mod writer;

pub use reader::*;
pub use writer::*;

use ferry_core::FerryError;

/// Convert a `csv` error into the Ferry error taxonomy
pub(crate) fn map_csv_error(path: &str, err: csv::Error) -> FerryError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => FerryError::Io(io),
            other => FerryError::Format(format!("{}: {:?}", path, other)),
        }
    } else {
        FerryError::Format(format!("{}: {}", path, err))
    }
}
