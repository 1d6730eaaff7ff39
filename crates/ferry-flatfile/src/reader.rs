//! Flat-file schema discovery and projected reads

use std::fs::File;

use csv::{ReaderBuilder, StringRecord};
use ferry_core::{
    ColumnDescriptor, FerryError, FlatFileEndpoint, INFERENCE_SAMPLE_ROWS, Record, Result,
    TypeTracker, Value,
};

use crate::map_csv_error;

/// Reader bound to one flat-file endpoint
#[derive(Debug)]
pub struct FlatFileReader<'a> {
    endpoint: &'a FlatFileEndpoint,
    delimiter: u8,
}

impl<'a> FlatFileReader<'a> {
    /// Validate the endpoint; the file itself is opened per call
    pub fn new(endpoint: &'a FlatFileEndpoint) -> Result<Self> {
        if !endpoint.has_path() {
            return Err(FerryError::validation("Please enter a file name"));
        }
        let delimiter = endpoint.delimiter_byte()?;
        Ok(Self {
            endpoint,
            delimiter,
        })
    }

    fn path(&self) -> &str {
        &self.endpoint.path
    }

    /// The file is its own single table
    pub fn list_tables(&self) -> Result<Vec<String>> {
        if !self.endpoint.file_path().is_file() {
            return Err(FerryError::NotFound(self.path().to_string()));
        }
        Ok(vec![self.path().to_string()])
    }

    fn open(&self) -> Result<csv::Reader<File>> {
        let file = File::open(self.endpoint.file_path()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FerryError::NotFound(self.path().to_string())
            } else {
                FerryError::Io(e)
            }
        })?;

        Ok(ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(file))
    }

    /// Read the column names and return the remaining data records
    fn header_and_rows(
        &self,
        reader: &mut csv::Reader<File>,
    ) -> Result<(Vec<String>, Option<StringRecord>)> {
        let mut first = StringRecord::new();
        let has_row = reader
            .read_record(&mut first)
            .map_err(|e| map_csv_error(self.path(), e))?;

        if !has_row {
            return Err(FerryError::Format(format!(
                "{}: file is empty, no header row found",
                self.path()
            )));
        }

        if self.endpoint.has_header {
            let names = first.iter().map(|s| s.trim().to_string()).collect();
            Ok((names, None))
        } else {
            let names = (1..=first.len()).map(|i| format!("column_{}", i)).collect();
            Ok((names, Some(first)))
        }
    }

    /// Column names in file order
    pub fn headers(&self) -> Result<Vec<String>> {
        let mut reader = self.open()?;
        let (headers, _) = self.header_and_rows(&mut reader)?;
        Ok(headers)
    }

    /// Column descriptors with types inferred from the first sampled rows
    pub fn schema(&self) -> Result<Vec<ColumnDescriptor>> {
        let mut reader = self.open()?;
        let (headers, pending) = self.header_and_rows(&mut reader)?;
        let mut trackers = vec![TypeTracker::new(); headers.len()];

        let mut observe = |record: &StringRecord| {
            for (tracker, cell) in trackers.iter_mut().zip(record.iter()) {
                tracker.observe_str(cell);
            }
        };

        let mut sampled = 0;
        if let Some(first) = pending.as_ref() {
            observe(first);
            sampled += 1;
        }

        let mut record = StringRecord::new();
        while sampled < INFERENCE_SAMPLE_ROWS
            && reader
                .read_record(&mut record)
                .map_err(|e| map_csv_error(self.path(), e))?
        {
            observe(&record);
            sampled += 1;
        }

        tracing::debug!(file = %self.path(), columns = headers.len(), sampled, "inferred flat-file schema");

        Ok(headers
            .into_iter()
            .zip(trackers)
            .map(|(name, tracker)| ColumnDescriptor::typed(name, tracker.inferred_type()))
            .collect())
    }

    /// Read projected records; an empty projection selects every column
    pub fn read(&self, columns: &[String], limit: Option<usize>) -> Result<Vec<Record>> {
        let mut reader = self.open()?;
        let (headers, pending) = self.header_and_rows(&mut reader)?;
        let projection = project(self.path(), &headers, columns)?;

        let to_record = |raw: &StringRecord| -> Record {
            projection
                .iter()
                .map(|(name, idx)| {
                    let value = raw
                        .get(*idx)
                        .map(|cell| Value::String(cell.to_string()))
                        .unwrap_or(Value::Null);
                    (name.clone(), value)
                })
                .collect()
        };

        let limit = limit.unwrap_or(usize::MAX);
        let mut rows = Vec::new();

        if let Some(first) = pending.as_ref() {
            if rows.len() < limit {
                rows.push(to_record(first));
            }
        }

        let mut raw = StringRecord::new();
        while rows.len() < limit
            && reader
                .read_record(&mut raw)
                .map_err(|e| map_csv_error(self.path(), e))?
        {
            if raw.len() == 1 && raw.get(0).is_some_and(str::is_empty) {
                continue;
            }
            rows.push(to_record(&raw));
        }

        tracing::debug!(file = %self.path(), rows = rows.len(), "read flat-file records");
        Ok(rows)
    }
}

/// Resolve requested column names to header positions, keeping request order
fn project(path: &str, headers: &[String], columns: &[String]) -> Result<Vec<(String, usize)>> {
    if columns.is_empty() {
        return Ok(headers.iter().cloned().enumerate().map(|(i, h)| (h, i)).collect());
    }

    let mut missing = Vec::new();
    let mut projection = Vec::with_capacity(columns.len());
    for column in columns {
        match headers.iter().position(|h| h == column) {
            Some(idx) => projection.push((column.clone(), idx)),
            None => missing.push(column.as_str()),
        }
    }

    if !missing.is_empty() {
        return Err(FerryError::NotFound(format!(
            "columns not found in file {}: {}",
            path,
            missing.join(", ")
        )));
    }
    Ok(projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_keeps_request_order() {
        let headers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let projection = project("f.csv", &headers, &["c".to_string(), "a".to_string()]).unwrap();
        assert_eq!(projection, vec![("c".to_string(), 2), ("a".to_string(), 0)]);
    }

    #[test]
    fn test_project_reports_missing_columns() {
        let headers = vec!["a".to_string()];
        let err = project("f.csv", &headers, &["x".to_string(), "y".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Not found: columns not found in file f.csv: x, y");
    }

    #[test]
    fn test_empty_projection_selects_all() {
        let headers = vec!["a".to_string(), "b".to_string()];
        let projection = project("f.csv", &headers, &[]).unwrap();
        assert_eq!(projection.len(), 2);
    }

    #[test]
    fn test_reader_requires_path() {
        let endpoint = FlatFileEndpoint::default();
        let err = FlatFileReader::new(&endpoint).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a file name");
    }

    #[test]
    fn test_reader_rejects_non_ascii_delimiter() {
        let endpoint = FlatFileEndpoint::new("data.csv").with_delimiter('§');
        let err = FlatFileReader::new(&endpoint).unwrap_err();
        assert_eq!(err.kind(), ferry_core::ErrorKind::Validation);
    }
}
