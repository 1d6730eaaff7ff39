//! Ferry Core - shared types and traits for moving data between ClickHouse
//! and delimited flat files
//!
//! Every other Ferry crate depends on this one. It defines:
//!
//! - `EndpointDescriptor` - Database or flat-file endpoint configuration
//! - `TableReference` / `ColumnDescriptor` - Schema catalog entries
//! - `TransferRequest` / `TransferOutcome` - Immutable transfer snapshots
//! - `TransferBackend` - The contract the transfer engine must satisfy
//! - `TypeTracker` - Column type inference shared by both endpoint kinds
//! - `FerryError` - The error taxonomy shared by all layers

mod backend;
mod endpoint;
mod error;
mod infer;
mod response;
mod schema;
mod transfer;
mod types;

pub use backend::*;
pub use endpoint::*;
pub use error::*;
pub use infer::*;
pub use response::*;
pub use schema::*;
pub use transfer::*;
pub use types::*;
