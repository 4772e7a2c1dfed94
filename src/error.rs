//! Error types for the todo synchronization layer.
//!
//! Every error here is `Clone` because one in-flight load may be awaited by
//! several readers at once and each of them receives the same outcome.

use thiserror::Error;

/// Failure talking to the remote todo resource.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
  /// Server answered with a non-2xx status.
  #[error("request to {url} failed with status {status}")]
  Status {
    /// HTTP status code.
    status: u16,
    /// Requested URL.
    url: String,
  },

  /// Connection, DNS or timeout failure.
  #[error("network error: {0}")]
  Network(String),

  /// Body could not be decoded as the expected JSON shape.
  #[error("failed to decode response: {0}")]
  Decode(String),

  /// The endpoint URL could not be built from the configured base.
  #[error("invalid endpoint url: {0}")]
  InvalidUrl(String),
}

impl From<reqwest::Error> for TransportError {
  fn from(e: reqwest::Error) -> Self {
    if let Some(status) = e.status() {
      let url = e.url().map(|u| u.to_string()).unwrap_or_default();
      return Self::Status {
        status: status.as_u16(),
        url,
      };
    }
    if e.is_decode() {
      Self::Decode(e.to_string())
    } else {
      Self::Network(e.to_string())
    }
  }
}

/// Failure in the durable key-value store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
  /// Backend could not be opened or migrated.
  #[error("failed to open cache store: {0}")]
  Open(String),

  /// A read or write against the backend failed.
  #[error("cache store query failed: {0}")]
  Query(String),

  /// Snapshot could not be serialized.
  #[error("failed to serialize snapshot: {0}")]
  Serialize(String),

  /// Lock around the connection was poisoned.
  #[error("cache store lock poisoned")]
  Lock,
}

impl From<rusqlite::Error> for StorageError {
  fn from(e: rusqlite::Error) -> Self {
    Self::Query(e.to_string())
  }
}

/// Errors surfaced by the synchronization cache and the cached client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
  /// Network or HTTP failure. The cached snapshot is left unchanged.
  #[error(transparent)]
  Transport(#[from] TransportError),

  /// Caller-supplied input rejected before any network call.
  #[error("{0}")]
  Validation(String),

  /// Another mutation on the same target has not settled yet.
  #[error("a change to {target} is already in progress")]
  MutationInProgress {
    /// Target the rejected mutation addressed.
    target: String,
  },

  /// Durable store failure.
  #[error(transparent)]
  Storage(#[from] StorageError),
}

/// Failure raised while producing a view, caught only by the error boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderFailure {
  pub message: String,
}

impl RenderFailure {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transport_error_converts_into_sync_error() {
    let err: SyncError = TransportError::Status {
      status: 404,
      url: "https://example.test/todos/9".to_string(),
    }
    .into();
    assert_eq!(
      err.to_string(),
      "request to https://example.test/todos/9 failed with status 404"
    );
  }

  #[test]
  fn test_mutation_in_progress_message() {
    let err = SyncError::MutationInProgress {
      target: "todo 5".to_string(),
    };
    assert_eq!(err.to_string(), "a change to todo 5 is already in progress");
  }
}
