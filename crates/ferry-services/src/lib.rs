//! Ferry Services Layer
//!
//! This crate holds the transfer workflow: the state machine that sequences
//! schema discovery, column projection, preview and ingestion, plus the
//! validation that keeps invalid requests away from the backend.
//!
//! # Architecture
//!
//! ```text
//! Front end (ferry-cli)
//!     ↓
//! Service Layer (ferry-services) ← This crate
//!     ↓
//! TransferBackend (ferry-core trait, ferry-transfer engine)
//!     ↓
//! Drivers (ferry-driver-clickhouse, ferry-flatfile)
//! ```
//!
//! # Components
//!
//! - [`TransferOrchestrator`] - Workflow state machine with a single in-flight slot
//! - [`SchemaCatalogClient`] - Table and column discovery
//! - [`ProjectionState`] - Selected tables, join predicate and columns
//! - [`SessionState`] / [`Status`] - What the workflow last did and said

mod catalog;
mod orchestrator;
mod projection;
mod session;

pub use catalog::SchemaCatalogClient;
pub use orchestrator::TransferOrchestrator;
pub use projection::ProjectionState;
pub use session::{SessionState, Status};
