//! Error types for Ferry

use serde::Serialize;
use thiserror::Error;

/// Core error type for Ferry operations
#[derive(Error, Debug)]
pub enum FerryError {
    /// A local precondition failed; no collaborator was contacted
    #[error("{0}")]
    Validation(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Another operation is already in progress: {0}")]
    Concurrency(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Discriminant of [`FerryError`], stable for matching and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Connection,
    Protocol,
    Format,
    NotFound,
    Concurrency,
    Query,
    Io,
    Serialization,
}

impl FerryError {
    pub fn validation(message: impl Into<String>) -> Self {
        FerryError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FerryError::Validation(_) => ErrorKind::Validation,
            FerryError::Connection(_) => ErrorKind::Connection,
            FerryError::Protocol(_) => ErrorKind::Protocol,
            FerryError::Format(_) => ErrorKind::Format,
            FerryError::NotFound(_) => ErrorKind::NotFound,
            FerryError::Concurrency(_) => ErrorKind::Concurrency,
            FerryError::Query(_) => ErrorKind::Query,
            FerryError::Io(_) => ErrorKind::Io,
            FerryError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// True for errors detected locally, before any collaborator call
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::Concurrency
        )
    }
}

/// Result type alias for Ferry operations
pub type Result<T> = std::result::Result<T, FerryError>;
