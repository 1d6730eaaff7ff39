//! Transfer workflow orchestrator
//!
//! Sequences schema discovery, column projection, preview and ingestion
//! across the two endpoint kinds. Every action validates its preconditions
//! locally before anything is sent to the backend, and at most one backend
//! round trip is outstanding at a time.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use ferry_core::{
    ColumnDescriptor, DatabaseEndpoint, EndpointDescriptor, EndpointKind, FerryError,
    FlatFileEndpoint, Record, Result, TableReference, TransferBackend, TransferRequest,
};

use crate::catalog::SchemaCatalogClient;
use crate::projection::ProjectionState;
use crate::session::{SessionState, Status};

const BUSY_MESSAGE: &str = "a transfer operation is still running";

/// Everything an action may read or mutate
#[derive(Debug, Clone)]
struct Inner {
    source_kind: EndpointKind,
    target_kind: EndpointKind,
    database: DatabaseEndpoint,
    flat_file: FlatFileEndpoint,
    target_table: String,
    /// Separate flat-file target path; falls back to `flat_file.path`
    target_file: String,
    projection: ProjectionState,
    session: SessionState,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            source_kind: EndpointKind::Database,
            target_kind: EndpointKind::FlatFile,
            database: DatabaseEndpoint::default(),
            flat_file: FlatFileEndpoint::default(),
            target_table: String::new(),
            target_file: String::new(),
            projection: ProjectionState::default(),
            session: SessionState::default(),
        }
    }
}

impl Inner {
    fn descriptor(&self, kind: EndpointKind) -> EndpointDescriptor {
        match kind {
            EndpointKind::Database => self.database.clone().into(),
            EndpointKind::FlatFile => self.flat_file.clone().into(),
        }
    }

    /// Table reference for a database source; `None` for a flat-file source
    fn source_table(&self) -> Result<Option<TableReference>> {
        match self.source_kind {
            EndpointKind::Database => self
                .projection
                .table_reference()
                .filter(|t| !t.is_empty())
                .map(Some)
                .ok_or_else(|| FerryError::validation("Please select a table first")),
            EndpointKind::FlatFile => {
                if self.flat_file.has_path() {
                    Ok(None)
                } else {
                    Err(FerryError::validation("Please enter a file name"))
                }
            }
        }
    }

    /// Target table name or file path the ingest writes to
    fn target_name(&self) -> Result<String> {
        match self.target_kind {
            EndpointKind::Database => {
                let table = self.target_table.trim();
                if table.is_empty() {
                    return Err(FerryError::validation("Please enter a target table name"));
                }
                Ok(table.to_string())
            }
            EndpointKind::FlatFile => {
                let file = match self.target_file.trim() {
                    "" => self.flat_file.path.trim(),
                    file => file,
                };
                if file.is_empty() {
                    return Err(FerryError::validation("Please enter a target file name"));
                }
                // The writer truncates its path before the rows are written
                if self.source_kind == EndpointKind::FlatFile
                    && Path::new(file) == Path::new(self.flat_file.path.trim())
                {
                    return Err(FerryError::validation(
                        "Please enter a target file different from the source file",
                    ));
                }
                Ok(file.to_string())
            }
        }
    }
}

/// Releases the in-flight slot when dropped
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The transfer workflow state machine
///
/// `Send + Sync`; share it behind an `Arc`. Actions take `&self` and the
/// session lock is never held across an `.await`.
pub struct TransferOrchestrator {
    catalog: SchemaCatalogClient,
    backend: Arc<dyn TransferBackend>,
    in_flight: AtomicBool,
    inner: Mutex<Inner>,
}

impl TransferOrchestrator {
    pub fn new(backend: Arc<dyn TransferBackend>) -> Self {
        Self {
            catalog: SchemaCatalogClient::new(backend.clone()),
            backend,
            in_flight: AtomicBool::new(false),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Start from explicit endpoint descriptors
    pub fn with_endpoints(
        backend: Arc<dyn TransferBackend>,
        database: DatabaseEndpoint,
        flat_file: FlatFileEndpoint,
    ) -> Self {
        let orchestrator = Self::new(backend);
        {
            let mut inner = orchestrator.inner.lock();
            inner.database = database;
            inner.flat_file = flat_file;
        }
        orchestrator
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FerryError::Concurrency(BUSY_MESSAGE.to_string()))?;
        Ok(InFlight {
            flag: &self.in_flight,
        })
    }

    /// Apply a mutation unless a round trip is outstanding
    fn mutate<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> Result<R> {
        let mut inner = self.inner.lock();
        if self.in_flight.load(Ordering::Acquire) {
            return Err(FerryError::Concurrency(BUSY_MESSAGE.to_string()));
        }
        Ok(f(&mut inner))
    }

    /// Record a failed precondition; status is left as it was
    fn reject(inner: &mut Inner, err: FerryError) -> FerryError {
        tracing::debug!(error = %err, status = %inner.session.status, "action refused");
        inner.session.message = err.to_string();
        err
    }

    fn fail(&self, err: FerryError) -> FerryError {
        tracing::error!(error = %err, kind = ?err.kind(), "backend call failed");
        self.inner.lock().session.transition(Status::Error, err.to_string());
        err
    }

    /// Connect to the database source and load its table catalog
    #[tracing::instrument(skip(self))]
    pub async fn connect(&self) -> Result<Vec<String>> {
        let _guard = self.begin()?;

        let descriptor = {
            let mut inner = self.inner.lock();
            if inner.source_kind != EndpointKind::Database {
                return Err(Self::reject(
                    &mut inner,
                    FerryError::validation("Connect is only available for a ClickHouse source"),
                ));
            }
            if let Err(err) = inner.database.validate() {
                return Err(Self::reject(&mut inner, err));
            }
            inner
                .session
                .transition(Status::Connecting, "Connecting to ClickHouse...");
            inner.descriptor(EndpointKind::Database)
        };

        match self.catalog.list_tables(&descriptor).await {
            Ok(tables) => {
                let message = format!("Connected to ClickHouse. Found {} tables.", tables.len());
                tracing::info!(tables = tables.len(), "connected");
                let mut inner = self.inner.lock();
                inner.session.tables = tables.clone();
                inner.session.transition(Status::Idle, message);
                Ok(tables)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Load the column catalog for the selected table(s) or the source file
    #[tracing::instrument(skip(self))]
    pub async fn load_schema(&self) -> Result<Vec<ColumnDescriptor>> {
        let _guard = self.begin()?;

        let (descriptor, table) = {
            let mut inner = self.inner.lock();
            let table = match inner.source_table() {
                Ok(table) => table,
                Err(err) => return Err(Self::reject(&mut inner, err)),
            };
            let message = match inner.source_kind {
                EndpointKind::Database => "Loading columns...",
                EndpointKind::FlatFile => "Loading file schema...",
            };
            inner.session.transition(Status::Fetching, message);
            (inner.descriptor(inner.source_kind), table)
        };

        match self.catalog.list_columns(&descriptor, table.as_ref()).await {
            Ok(columns) => {
                let message = match (&descriptor, &table) {
                    (EndpointDescriptor::Database(_), Some(table)) => {
                        format!("Loaded {} columns from table {}.", columns.len(), table)
                    }
                    _ => format!("Loaded schema from {}.", descriptor.label()),
                };
                tracing::info!(columns = columns.len(), "schema loaded");
                let mut inner = self.inner.lock();
                inner.projection.replace_catalog(columns.clone());
                inner.session.transition(Status::Idle, message);
                Ok(columns)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Fetch at most `limit` projected rows; nothing is written
    #[tracing::instrument(skip(self))]
    pub async fn preview(&self, limit: usize) -> Result<Vec<Record>> {
        let _guard = self.begin()?;

        let request = {
            let mut inner = self.inner.lock();
            let checked = if limit == 0 {
                Err(FerryError::validation("Preview limit must be at least 1"))
            } else {
                inner.source_table().and_then(|table| {
                    inner.projection.validate_selection()?;
                    Ok(table)
                })
            };
            let table = match checked {
                Ok(table) => table,
                Err(err) => return Err(Self::reject(&mut inner, err)),
            };
            inner
                .session
                .transition(Status::Fetching, "Loading preview data...");
            TransferRequest::preview(
                inner.descriptor(inner.source_kind),
                inner.descriptor(inner.target_kind),
                table,
                inner.projection.selected_columns(),
                limit,
            )
        };

        match self.backend.run_transfer(&request).await {
            Ok(outcome) => {
                let message = format!("Preview loaded {} records.", outcome.rows.len());
                tracing::info!(rows = outcome.rows.len(), "preview loaded");
                let mut inner = self.inner.lock();
                inner.session.preview_rows = outcome.rows.clone();
                inner.session.transition(Status::Idle, message);
                Ok(outcome.rows)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Move every projected row to the target and report the count
    #[tracing::instrument(skip(self))]
    pub async fn ingest(&self) -> Result<u64> {
        let _guard = self.begin()?;

        let request = {
            let mut inner = self.inner.lock();
            let checked = inner.source_table().and_then(|table| {
                inner.projection.validate_selection()?;
                Ok((table, inner.target_name()?))
            });
            let (table, target_name) = match checked {
                Ok(checked) => checked,
                Err(err) => return Err(Self::reject(&mut inner, err)),
            };
            inner
                .session
                .transition(Status::Ingesting, "Starting data ingestion...");
            TransferRequest::full(
                inner.descriptor(inner.source_kind),
                inner.descriptor(inner.target_kind),
                table,
                inner.projection.selected_columns(),
                target_name,
            )
        };

        match self.backend.run_transfer(&request).await {
            Ok(outcome) => {
                let message = format!(
                    "Ingestion completed successfully. {} records processed.",
                    outcome.count
                );
                tracing::info!(count = outcome.count, target = request.target_name(), "ingestion completed");
                let mut inner = self.inner.lock();
                inner.session.record_count = Some(outcome.count);
                inner.session.transition(Status::Completed, message);
                Ok(outcome.count)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    // Endpoint configuration

    /// Choose the source kind; a real change clears tables, columns,
    /// selection and preview rows
    pub fn set_source_kind(&self, kind: EndpointKind) -> Result<()> {
        self.mutate(|inner| {
            if inner.source_kind == kind {
                return;
            }
            tracing::debug!(from = %inner.source_kind, to = %kind, "source kind changed");
            inner.source_kind = kind;
            inner.projection.reset();
            inner.session.tables.clear();
            inner.session.preview_rows.clear();
        })
    }

    pub fn set_target_kind(&self, kind: EndpointKind) -> Result<()> {
        self.mutate(|inner| inner.target_kind = kind)
    }

    pub fn set_database_endpoint(&self, endpoint: DatabaseEndpoint) -> Result<()> {
        self.mutate(|inner| inner.database = endpoint)
    }

    /// Edit the database descriptor in place
    pub fn update_database_endpoint(&self, f: impl FnOnce(&mut DatabaseEndpoint)) -> Result<()> {
        self.mutate(|inner| f(&mut inner.database))
    }

    /// Replace the flat-file descriptor; pointing a flat-file source at a
    /// different file clears its column catalog
    pub fn set_flat_file_endpoint(&self, endpoint: FlatFileEndpoint) -> Result<()> {
        self.mutate(|inner| {
            if inner.source_kind == EndpointKind::FlatFile && inner.flat_file.path != endpoint.path {
                inner.projection.clear_catalog();
            }
            inner.flat_file = endpoint;
        })
    }

    pub fn set_target_table(&self, table: &str) -> Result<()> {
        self.mutate(|inner| inner.target_table = table.to_string())
    }

    pub fn set_target_file(&self, path: &str) -> Result<()> {
        self.mutate(|inner| inner.target_file = path.to_string())
    }

    // Projection

    pub fn select_table(&self, table: &str) -> Result<()> {
        self.mutate(|inner| inner.projection.select_table(table))
    }

    pub fn toggle_table(&self, table: &str) -> Result<bool> {
        self.mutate(|inner| inner.projection.toggle_table(table))
    }

    pub fn set_join_mode(&self, enabled: bool) -> Result<()> {
        self.mutate(|inner| inner.projection.set_join_mode(enabled))
    }

    pub fn set_join_condition(&self, condition: &str) -> Result<()> {
        self.mutate(|inner| inner.projection.set_join_condition(condition))
    }

    pub fn toggle_column(&self, column: &str) -> Result<bool> {
        self.mutate(|inner| inner.projection.toggle_column(column))
    }

    pub fn select_all(&self) -> Result<()> {
        self.mutate(|inner| inner.projection.select_all())
    }

    pub fn deselect_all(&self) -> Result<()> {
        self.mutate(|inner| inner.projection.deselect_all())
    }

    // Snapshots

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn status(&self) -> Status {
        self.inner.lock().session.status
    }

    pub fn message(&self) -> String {
        self.inner.lock().session.message.clone()
    }

    pub fn tables(&self) -> Vec<String> {
        self.inner.lock().session.tables.clone()
    }

    pub fn preview_rows(&self) -> Vec<Record> {
        self.inner.lock().session.preview_rows.clone()
    }

    pub fn record_count(&self) -> Option<u64> {
        self.inner.lock().session.record_count
    }

    pub fn session(&self) -> SessionState {
        self.inner.lock().session.clone()
    }

    pub fn projection(&self) -> ProjectionState {
        self.inner.lock().projection.clone()
    }

    pub fn source_kind(&self) -> EndpointKind {
        self.inner.lock().source_kind
    }

    pub fn target_kind(&self) -> EndpointKind {
        self.inner.lock().target_kind
    }

    pub fn database_endpoint(&self) -> DatabaseEndpoint {
        self.inner.lock().database.clone()
    }

    pub fn flat_file_endpoint(&self) -> FlatFileEndpoint {
        self.inner.lock().flat_file.clone()
    }

    pub fn target_table(&self) -> String {
        self.inner.lock().target_table.clone()
    }

    /// Resolved flat-file target path, if one is configured
    pub fn target_file(&self) -> Option<String> {
        let inner = self.inner.lock();
        match inner.target_file.trim() {
            "" if inner.flat_file.has_path() => Some(inner.flat_file.path.trim().to_string()),
            "" => None,
            file => Some(file.to_string()),
        }
    }
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TransferOrchestrator")
            .field("status", &inner.session.status)
            .field("source_kind", &inner.source_kind)
            .field("target_kind", &inner.target_kind)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}
