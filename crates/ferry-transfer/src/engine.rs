use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ferry_core::{
    ColumnDescriptor, EndpointDescriptor, FerryError, FlatFileEndpoint, Record, Result,
    TableReference, TransferBackend, TransferMode, TransferOutcome, TransferRequest,
};
use ferry_driver_clickhouse::{ClickHouseClient, DEFAULT_INSERT_BATCH_SIZE};
use ferry_flatfile::{FlatFileReader, FlatFileWriter};

/// Engine tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows per ClickHouse `INSERT` statement
    pub insert_batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            insert_batch_size: DEFAULT_INSERT_BATCH_SIZE,
        }
    }
}

/// Backend that talks to real endpoints
#[derive(Debug, Clone, Default)]
pub struct EngineBackend {
    config: EngineConfig,
}

impl EngineBackend {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn read_source(
        &self,
        source: &EndpointDescriptor,
        table: Option<&TableReference>,
        columns: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<Record>> {
        match source {
            EndpointDescriptor::Database(db) => {
                let reference =
                    table.ok_or_else(|| FerryError::validation("Please select a table first"))?;
                let client = ClickHouseClient::new(db)?;
                client.fetch(reference, columns, limit).await
            }
            EndpointDescriptor::FlatFile(ff) => {
                let ff = ff.clone();
                let columns = columns.to_vec();
                run_blocking(move || FlatFileReader::new(&ff)?.read(&columns, limit)).await
            }
        }
    }

    async fn write_target(
        &self,
        target: &EndpointDescriptor,
        target_name: &str,
        columns: &[String],
        rows: Vec<Record>,
    ) -> Result<u64> {
        match target {
            EndpointDescriptor::Database(db) => {
                let client = ClickHouseClient::new(db)?;
                client
                    .insert_records(target_name, columns, &rows, self.config.insert_batch_size)
                    .await
            }
            EndpointDescriptor::FlatFile(ff) => {
                let ff = target_file(ff, target_name);
                let columns = columns.to_vec();
                run_blocking(move || FlatFileWriter::new(&ff)?.write(&columns, &rows)).await
            }
        }
    }
}

/// A non-empty target name overrides the flat-file descriptor's path
fn target_file(endpoint: &FlatFileEndpoint, target_name: &str) -> FlatFileEndpoint {
    let mut endpoint = endpoint.clone();
    if !target_name.trim().is_empty() {
        endpoint.path = target_name.trim().to_string();
    }
    endpoint
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FerryError::Io(std::io::Error::other(e)))?
}

#[async_trait]
impl TransferBackend for EngineBackend {
    #[tracing::instrument(skip(self, endpoint), fields(endpoint = %endpoint.label()))]
    async fn list_tables(&self, endpoint: &EndpointDescriptor) -> Result<Vec<String>> {
        match endpoint {
            EndpointDescriptor::Database(db) => {
                let client = ClickHouseClient::connect(db).await?;
                client.list_tables().await
            }
            EndpointDescriptor::FlatFile(ff) => {
                let ff = ff.clone();
                run_blocking(move || FlatFileReader::new(&ff)?.list_tables()).await
            }
        }
    }

    #[tracing::instrument(skip(self, endpoint, table), fields(endpoint = %endpoint.label()))]
    async fn list_columns(
        &self,
        endpoint: &EndpointDescriptor,
        table: Option<&TableReference>,
    ) -> Result<Vec<ColumnDescriptor>> {
        match endpoint {
            EndpointDescriptor::Database(db) => {
                let reference = table
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| FerryError::validation("Please select a table first"))?;
                let client = ClickHouseClient::new(db)?;
                client.describe_reference(reference).await
            }
            EndpointDescriptor::FlatFile(ff) => {
                let ff = ff.clone();
                run_blocking(move || FlatFileReader::new(&ff)?.schema()).await
            }
        }
    }

    #[tracing::instrument(skip(self, request), fields(mode = ?request.mode(), columns = request.columns().len()))]
    async fn run_transfer(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        match request.mode() {
            TransferMode::Preview { limit } => {
                let rows = self
                    .read_source(request.source(), request.table(), request.columns(), Some(limit))
                    .await?;
                tracing::debug!(rows = rows.len(), "preview read");
                Ok(TransferOutcome::preview(rows))
            }
            TransferMode::Full => {
                if let (EndpointDescriptor::FlatFile(source), EndpointDescriptor::FlatFile(target)) =
                    (request.source(), request.target())
                {
                    let target = target_file(target, request.target_name());
                    if Path::new(target.path.trim()) == Path::new(source.path.trim()) {
                        return Err(FerryError::validation(
                            "Please enter a target file different from the source file",
                        ));
                    }
                }
                let rows = self
                    .read_source(request.source(), request.table(), request.columns(), None)
                    .await?;
                tracing::debug!(rows = rows.len(), "source read");
                let count = self
                    .write_target(request.target(), request.target_name(), request.columns(), rows)
                    .await?;
                tracing::info!(count, "transfer completed");
                Ok(TransferOutcome::moved(count))
            }
        }
    }
}
