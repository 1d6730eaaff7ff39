//! ClickHouse schema introspection

use ferry_core::{ColumnDescriptor, FerryError, Result, TableReference};

use crate::ClickHouseClient;
use crate::driver::map_error;
use crate::sql::{quote_identifier, quote_string};

impl ClickHouseClient {
    /// Tables of the current database, ordered by name
    #[tracing::instrument(skip(self), fields(database = %self.database()))]
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let sql = "SELECT name FROM system.tables \
                   WHERE database = currentDatabase() AND is_temporary = 0 \
                   ORDER BY name";
        let rows = self.fetch_records(sql, &["name".to_string()]).await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get("name").and_then(|v| v.as_str()).map(str::to_string))
            .collect())
    }

    /// Columns of one table in position order
    #[tracing::instrument(skip(self))]
    pub async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let sql = format!(
            "SELECT name, type FROM system.columns \
             WHERE database = currentDatabase() AND table = {} \
             ORDER BY position",
            quote_string(table)
        );
        let rows = self
            .fetch_records(&sql, &["name".to_string(), "type".to_string()])
            .await?;

        if rows.is_empty() {
            return Err(FerryError::NotFound(format!(
                "table {}.{} does not exist",
                self.database(),
                table
            )));
        }

        Ok(rows
            .iter()
            .filter_map(|row| {
                let name = row.get("name").and_then(|v| v.as_str())?;
                let data_type = row.get("type").and_then(|v| v.as_str()).unwrap_or("String");
                Some(ColumnDescriptor::typed(name, data_type))
            })
            .collect())
    }

    /// Columns of a table reference; join columns are qualified `table.column`
    pub async fn describe_reference(&self, reference: &TableReference) -> Result<Vec<ColumnDescriptor>> {
        if reference.is_empty() {
            return Err(FerryError::validation("Please select a table first"));
        }

        if !reference.is_multi_table() {
            let table = reference.primary_table().unwrap_or_default();
            return self.describe_table(table).await;
        }

        let mut columns = Vec::new();
        for table in reference.tables() {
            let described = self.describe_table(table).await?;
            columns.extend(described.into_iter().map(|c| c.qualified(table)));
        }
        Ok(columns)
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = format!("EXISTS TABLE {}", quote_identifier(table));
        let exists: u8 = self
            .client()
            .query(&sql)
            .fetch_one()
            .await
            .map_err(map_error)?;
        Ok(exists == 1)
    }
}
