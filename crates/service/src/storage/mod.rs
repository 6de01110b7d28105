//! Storage abstractions for the service layer
//!
//! `KeyedStore` keeps an ordered map in memory and journals every mutation
//! through a `StableStorage` backend before applying it.

pub mod backend;
pub mod journal;
pub mod keyed_store;

use std::sync::Arc;

pub use backend::{JsonFileStorage, MemoryStorage, MemoryVolume, StableStorage, StorageLocation};
pub use keyed_store::KeyedStore;

/// Facility-wide mutation lock: operations that check one store and write
/// another hold it for their whole duration.
pub type WriteGate = Arc<tokio::sync::Mutex<()>>;

pub fn new_write_gate() -> WriteGate {
    Arc::new(tokio::sync::Mutex::new(()))
}
