//! ClickHouse driver for Ferry
//!
//! Talks to ClickHouse over its HTTP interface. Reads come back as
//! `JSONEachRow`; writes are batched `INSERT .. VALUES` statements.

mod driver;
#[cfg(test)]
mod driver_tests;
mod ingest;
mod schema;
pub mod sql;

pub use driver::*;
pub use ingest::DEFAULT_INSERT_BATCH_SIZE;
