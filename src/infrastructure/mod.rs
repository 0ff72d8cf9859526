//! Adapters for the domain ports: in-memory stores for tests and the CLI
//! driver, a sandbox payment provider, notification senders, and an optional
//! RocksDB-backed persistent store.

pub mod in_memory;
pub mod notify;
pub mod provider;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
