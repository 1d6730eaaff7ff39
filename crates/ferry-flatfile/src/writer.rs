//! Flat-file writer

use csv::WriterBuilder;
use ferry_core::{FerryError, FlatFileEndpoint, Record, Result};

use crate::map_csv_error;

/// Writer bound to one flat-file endpoint
#[derive(Debug)]
pub struct FlatFileWriter<'a> {
    endpoint: &'a FlatFileEndpoint,
    delimiter: u8,
}

impl<'a> FlatFileWriter<'a> {
    pub fn new(endpoint: &'a FlatFileEndpoint) -> Result<Self> {
        if !endpoint.has_path() {
            return Err(FerryError::validation("Please enter a target file name"));
        }
        let delimiter = endpoint.delimiter_byte()?;
        Ok(Self {
            endpoint,
            delimiter,
        })
    }

    /// Create or truncate the file and write `rows` in `columns` order
    ///
    /// An empty `columns` slice takes the column order of the first row.
    /// Returns the number of records written, excluding the header.
    pub fn write(&self, columns: &[String], rows: &[Record]) -> Result<u64> {
        let path = self.endpoint.path.as_str();
        let columns: Vec<String> = if columns.is_empty() {
            rows.first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default()
        } else {
            columns.to_vec()
        };

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(false)
            .from_path(self.endpoint.file_path())
            .map_err(|e| map_csv_error(path, e))?;

        if self.endpoint.has_header && !columns.is_empty() {
            writer
                .write_record(&columns)
                .map_err(|e| map_csv_error(path, e))?;
        }

        let mut written = 0u64;
        for row in rows {
            let fields = columns
                .iter()
                .map(|column| row.get(column).map(|v| v.to_field()).unwrap_or_default());
            writer
                .write_record(fields)
                .map_err(|e| map_csv_error(path, e))?;
            written += 1;
        }

        writer.flush()?;
        tracing::debug!(file = %path, records = written, "wrote flat file");
        Ok(written)
    }
}
