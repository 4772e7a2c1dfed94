//! Generic caching layer for query results and persisted snapshots.
//!
//! This module provides an entity-agnostic caching mechanism that:
//! - Keeps exactly one snapshot per query key, shared by all readers
//! - Collapses concurrent misses for a key into a single load
//! - Invalidates snapshots explicitly or after a staleness window
//! - Guards each mutation target against overlapping writes
//! - Persists a collection snapshot in a durable key-value store

mod layer;
mod storage;
mod traits;

pub use layer::SyncCache;
#[cfg(test)]
pub use storage::MemoryStore;
pub use storage::{KeyValueStore, NoopStore, PersistedCache, SqliteStore};
pub use traits::{Cacheable, LoadContext, MutationStatus, QueryKey};
