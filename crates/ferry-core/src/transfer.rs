//! Transfer requests and outcomes

use serde::Serialize;

use crate::{EndpointDescriptor, Record, TableReference};

/// Default number of rows returned by a preview
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Whether a transfer samples rows or moves all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransferMode {
    /// Return at most `limit` rows; nothing is written to the target
    Preview { limit: usize },
    /// Move every projected row to the target
    Full,
}

impl TransferMode {
    pub fn is_preview(&self) -> bool {
        matches!(self, TransferMode::Preview { .. })
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            TransferMode::Preview { limit } => Some(*limit),
            TransferMode::Full => None,
        }
    }
}

/// Immutable snapshot of everything a transfer needs
///
/// Built fresh for every preview or ingest call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    source: EndpointDescriptor,
    target: EndpointDescriptor,
    table: Option<TableReference>,
    columns: Vec<String>,
    target_name: String,
    mode: TransferMode,
}

impl TransferRequest {
    pub fn preview(
        source: EndpointDescriptor,
        target: EndpointDescriptor,
        table: Option<TableReference>,
        columns: Vec<String>,
        limit: usize,
    ) -> Self {
        Self {
            source,
            target,
            table,
            columns,
            target_name: String::new(),
            mode: TransferMode::Preview { limit },
        }
    }

    pub fn full(
        source: EndpointDescriptor,
        target: EndpointDescriptor,
        table: Option<TableReference>,
        columns: Vec<String>,
        target_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            table,
            columns,
            target_name: target_name.into(),
            mode: TransferMode::Full,
        }
    }

    pub fn source(&self) -> &EndpointDescriptor {
        &self.source
    }

    pub fn target(&self) -> &EndpointDescriptor {
        &self.target
    }

    /// Table reference; `None` when the source is a flat file
    pub fn table(&self) -> Option<&TableReference> {
        self.table.as_ref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn join_condition(&self) -> Option<&str> {
        self.table.as_ref().and_then(TableReference::join_condition)
    }

    /// Target table name (database) or file path (flat file)
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }
}

/// What the transfer engine reports back
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferOutcome {
    /// Preview rows; always empty for a full transfer
    pub rows: Vec<Record>,
    /// Preview row count, or total records moved for a full transfer
    pub count: u64,
}

impl TransferOutcome {
    pub fn preview(rows: Vec<Record>) -> Self {
        let count = rows.len() as u64;
        Self { rows, count }
    }

    pub fn moved(count: u64) -> Self {
        Self {
            rows: Vec::new(),
            count,
        }
    }
}
