//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Entities that can be persisted in a collection snapshot.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Entity type name for storage organization (e.g., "todo")
  fn entity_type() -> &'static str;
}

/// Identifier distinguishing cached result sets.
pub trait QueryKey: Clone + Send + Sync + 'static {
  /// Stable, fixed-length key used for lookups and durable storage.
  fn cache_hash(&self) -> String;

  /// Human-readable description for logs.
  fn description(&self) -> String;
}

/// Context handed to a loader when the synchronization cache needs data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadContext {
  /// True once the key was explicitly invalidated since the process started.
  pub invalidated: bool,
}

/// Lifecycle of a single create/update/delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
  #[default]
  Idle,
  Pending,
  Success,
  Error,
}

impl MutationStatus {
  pub fn is_pending(self) -> bool {
    self == MutationStatus::Pending
  }
}
