//! Key-value storage with expiry for llmbench.
//!
//! Everything the simulation pipeline keeps outside the relational store
//! lives here: cached ranking blobs, per-item retry counters, and the
//! distributed pipeline lock.
//!
//! # Key Types
//!
//! - [`KeyValueStore`] - Trait for reading, writing and conditionally deleting entries
//! - [`InMemoryKeyValueStore`] - Process-local implementation for tests and single-node runs
//! - [`LibsqlKeyValueStore`] - libSQL-backed implementation shared across instances

pub mod error;
pub mod libsql_store;
pub mod memory;
pub mod traits;

// Re-exports
pub use error::{Error, Result};
pub use libsql_store::LibsqlKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use traits::KeyValueStore;
