//! Workflow status and per-session results

use serde::Serialize;

use ferry_core::Record;

/// Where the workflow currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Connecting,
    Fetching,
    Ingesting,
    Completed,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Connecting => "connecting",
            Status::Fetching => "fetching",
            Status::Ingesting => "ingesting",
            Status::Completed => "completed",
            Status::Error => "error",
        }
    }

    /// A round trip is outstanding
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Status::Connecting | Status::Fetching | Status::Ingesting)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results and status of one workflow session
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub status: Status,
    pub message: String,
    /// Table catalog from the last successful connect
    pub tables: Vec<String>,
    /// Rows from the last successful preview
    pub preview_rows: Vec<Record>,
    /// Records moved by the last successful ingest
    pub record_count: Option<u64>,
}

impl SessionState {
    pub(crate) fn transition(&mut self, status: Status, message: impl Into<String>) {
        if self.status != status {
            tracing::debug!(from = %self.status, to = %status, "status transition");
        }
        self.status = status;
        self.message = message.into();
    }
}
