//! Transfer engine for Ferry
//!
//! [`EngineBackend`] implements [`ferry_core::TransferBackend`] by dispatching
//! each call to the ClickHouse driver or the flat-file codec, depending on the
//! endpoint variant. Flat-file I/O runs on tokio's blocking pool.

mod engine;

pub use engine::*;
