//! Schema catalog client
//!
//! Asks the backend for the tables or columns of whichever endpoint is the
//! source. Local preconditions are checked here so that an incomplete
//! request never reaches the backend.

use std::sync::Arc;

use ferry_core::{
    ColumnDescriptor, EndpointDescriptor, FerryError, Result, TableReference, TransferBackend,
};

/// Client for table and column discovery
#[derive(Clone)]
pub struct SchemaCatalogClient {
    backend: Arc<dyn TransferBackend>,
}

impl SchemaCatalogClient {
    pub fn new(backend: Arc<dyn TransferBackend>) -> Self {
        Self { backend }
    }

    #[tracing::instrument(skip(self, descriptor), fields(endpoint = %descriptor.label()))]
    pub async fn list_tables(&self, descriptor: &EndpointDescriptor) -> Result<Vec<String>> {
        if let EndpointDescriptor::FlatFile(ff) = descriptor {
            if !ff.has_path() {
                return Err(FerryError::validation("Please enter a file name"));
            }
        }
        self.backend.list_tables(descriptor).await
    }

    /// Columns for a database table reference or a flat file
    ///
    /// The table reference is ignored for flat files.
    #[tracing::instrument(skip(self, descriptor, table), fields(endpoint = %descriptor.label()))]
    pub async fn list_columns(
        &self,
        descriptor: &EndpointDescriptor,
        table: Option<&TableReference>,
    ) -> Result<Vec<ColumnDescriptor>> {
        match descriptor {
            EndpointDescriptor::Database(_) => {
                let table = table
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| FerryError::validation("Please select a table first"))?;
                self.backend.list_columns(descriptor, Some(table)).await
            }
            EndpointDescriptor::FlatFile(ff) => {
                if !ff.has_path() {
                    return Err(FerryError::validation("Please enter a file name"));
                }
                self.backend.list_columns(descriptor, None).await
            }
        }
    }
}

impl std::fmt::Debug for SchemaCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCatalogClient").finish_non_exhaustive()
    }
}
