//! The contract between the workflow orchestrator and the transfer engine

use async_trait::async_trait;

use crate::{
    ColumnDescriptor, EndpointDescriptor, Result, TableReference, TransferOutcome,
    TransferRequest,
};

/// Backend that discovers schemas and moves rows
///
/// Each method is a single request/response round trip. Implementations own
/// retries and timeouts; callers never retry.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// List table names available at the endpoint
    async fn list_tables(&self, endpoint: &EndpointDescriptor) -> Result<Vec<String>>;

    /// List columns for a table reference (database) or the file itself
    /// (flat file, where `table` is ignored)
    async fn list_columns(
        &self,
        endpoint: &EndpointDescriptor,
        table: Option<&TableReference>,
    ) -> Result<Vec<ColumnDescriptor>>;

    /// Run a preview or full transfer
    async fn run_transfer(&self, request: &TransferRequest) -> Result<TransferOutcome>;
}
