//! Common test utilities and mocks

use std::sync::Arc;

use async_trait::async_trait;
use ferry_core::{
    ColumnDescriptor, EndpointDescriptor, FerryError, Record, Result, TableReference,
    TransferBackend, TransferMode, TransferOutcome, TransferRequest,
};
use tokio::sync::Notify;

/// One recorded call into the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    ListTables(EndpointDescriptor),
    ListColumns(EndpointDescriptor, Option<TableReference>),
    RunTransfer(TransferRequest),
}

/// In-memory backend that records every call it receives
///
/// Responses are configured up front. A gate can hold every call until the
/// test releases it, which is how overlapping actions are exercised.
pub struct MockBackend {
    pub tables: Vec<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Record>,
    pub moved: u64,
    /// When set, every call fails with a connection error carrying this message
    pub failure: parking_lot::Mutex<Option<String>>,
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
    calls: Arc<parking_lot::Mutex<Vec<BackendCall>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            tables: vec![],
            columns: vec![],
            rows: vec![],
            moved: 0,
            failure: parking_lot::Mutex::new(None),
            gate: None,
            started: Arc::new(Notify::new()),
            calls: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_tables(mut self, tables: &[&str]) -> Self {
        self.tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_rows(mut self, rows: Vec<Record>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_moved(mut self, moved: u64) -> Self {
        self.moved = moved;
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        *self.failure.lock() = Some(message.into());
        self
    }

    /// Hold every call until [`MockBackend::release`] is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Wait until a gated call has been received
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    pub fn transfer_requests(&self) -> Vec<TransferRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::RunTransfer(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    async fn respond(&self, call: BackendCall) -> Result<()> {
        self.calls.lock().push(call);
        if let Some(gate) = &self.gate {
            self.started.notify_one();
            gate.notified().await;
        }
        match self.failure.lock().clone() {
            Some(message) => Err(FerryError::Connection(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TransferBackend for MockBackend {
    async fn list_tables(&self, endpoint: &EndpointDescriptor) -> Result<Vec<String>> {
        self.respond(BackendCall::ListTables(endpoint.clone())).await?;
        Ok(self.tables.clone())
    }

    async fn list_columns(
        &self,
        endpoint: &EndpointDescriptor,
        table: Option<&TableReference>,
    ) -> Result<Vec<ColumnDescriptor>> {
        self.respond(BackendCall::ListColumns(endpoint.clone(), table.cloned()))
            .await?;
        Ok(self.columns.clone())
    }

    async fn run_transfer(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        self.respond(BackendCall::RunTransfer(request.clone())).await?;
        match request.mode() {
            TransferMode::Preview { limit } => Ok(TransferOutcome::preview(
                self.rows.iter().take(limit).cloned().collect(),
            )),
            TransferMode::Full => Ok(TransferOutcome::moved(self.moved)),
        }
    }
}
