//! Bulk inserts into ClickHouse

use std::collections::HashMap;

use ferry_core::{FerryError, Record, Result, TypeTracker, Value};

use crate::ClickHouseClient;
use crate::sql::{build_create_table, build_insert_prefix, render_row, sanitize_column_name};

/// Rows per `INSERT` statement
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 10_000;

/// Infer `(sanitized name, type)` column definitions from the rows to insert
pub(crate) fn infer_column_defs(columns: &[String], rows: &[Record]) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|column| {
            let mut tracker = TypeTracker::new();
            for row in rows {
                tracker.observe(row.get(column).unwrap_or(&Value::Null));
            }
            (sanitize_column_name(column), tracker.inferred_type())
        })
        .collect()
}

impl ClickHouseClient {
    /// Insert `rows` into `table`, creating the table first when it is missing
    ///
    /// Column names are sanitized the same way for creation and insertion.
    /// Returns the number of rows sent.
    #[tracing::instrument(skip(self, columns, rows), fields(rows = rows.len()))]
    pub async fn insert_records(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Record],
        batch_size: usize,
    ) -> Result<u64> {
        let table = table.trim();
        if table.is_empty() {
            return Err(FerryError::validation("Please enter a target table name"));
        }
        if rows.is_empty() {
            tracing::info!("no rows to insert");
            return Ok(0);
        }

        let columns: Vec<String> = if columns.is_empty() {
            rows[0].keys().cloned().collect()
        } else {
            columns.to_vec()
        };

        if !self.table_exists(table).await? {
            let defs = infer_column_defs(&columns, rows);
            tracing::info!(table, columns = defs.len(), "creating target table");
            self.execute(&build_create_table(table, &defs)).await?;
        }

        let target_columns: Vec<String> = columns.iter().map(|c| sanitize_column_name(c)).collect();
        let existing: HashMap<String, String> = self
            .describe_table(table)
            .await?
            .into_iter()
            .map(|c| (c.name, c.data_type.unwrap_or_default()))
            .collect();

        let column_types = target_columns
            .iter()
            .map(|name| {
                existing.get(name).cloned().ok_or_else(|| {
                    FerryError::NotFound(format!("column {} not found in table {}", name, table))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let null = Value::Null;
        let prefix = build_insert_prefix(table, &target_columns);
        let mut inserted = 0u64;
        for batch in rows.chunks(batch_size.max(1)) {
            let values = batch
                .iter()
                .map(|row| {
                    let cells: Vec<&Value> = columns
                        .iter()
                        .map(|c| row.get(c).unwrap_or(&null))
                        .collect();
                    render_row(&cells, &column_types)
                })
                .collect::<Vec<_>>()
                .join(", ");

            self.execute(&format!("{}{}", prefix, values)).await?;
            inserted += batch.len() as u64;
            tracing::debug!(inserted, "batch inserted");
        }

        tracing::info!(table, inserted, "insert completed");
        Ok(inserted)
    }
}
