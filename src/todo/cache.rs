//! Caching implementations for todo types.

use sha2::{Digest, Sha256};

use crate::cache::{Cacheable, QueryKey};

use super::types::Todo;

impl Cacheable for Todo {
  fn entity_type() -> &'static str {
    "todo"
  }
}

/// Query keys for todo reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoQueryKey {
  /// The whole collection
  All,
  /// A single todo by id
  Detail { id: u64 },
}

impl QueryKey for TodoQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::All => "todos".to_string(),
      Self::Detail { id } => format!("todo:{}", id),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::All => "all todos".to_string(),
      Self::Detail { id } => format!("todo #{}", id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_hash_is_stable_and_distinct() {
    let all = TodoQueryKey::All.cache_hash();
    assert_eq!(all, TodoQueryKey::All.cache_hash());
    assert_eq!(all.len(), 64);
    assert_ne!(all, TodoQueryKey::Detail { id: 5 }.cache_hash());
    assert_ne!(
      TodoQueryKey::Detail { id: 5 }.cache_hash(),
      TodoQueryKey::Detail { id: 6 }.cache_hash()
    );
  }

  #[test]
  fn test_description() {
    assert_eq!(TodoQueryKey::Detail { id: 5 }.description(), "todo #5");
  }
}
