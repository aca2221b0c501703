//! Adapters behind the domain ports.

pub mod broadcast;
pub mod cashfree;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
