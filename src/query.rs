//! Async handles the views poll from their tick.
//!
//! `Query<T>` tracks a read, `Mutation<T>` tracks one create/update/delete.
//! Both spawn the work on the runtime and hand the outcome back over a
//! channel, so views never await anything themselves.
//!
//! # Example
//!
//! ```ignore
//! let todos = client.clone();
//! let mut query = Query::new(move || {
//!     let todos = todos.clone();
//!     async move { todos.list_todos().await.map_err(|e| e.to_string()) }
//! });
//!
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};

use crate::cache::MutationStatus;
use crate::error::SyncResult;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Async read with loading/success/error state.
///
/// Caching lives in the synchronization cache behind the fetcher; this only
/// tracks what the view should show right now.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called each time `fetch()` or `refetch()` is invoked.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
    }
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Check if the query is currently loading.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if the query failed.
  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Get the error message if the query failed.
  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Start fetching data if not already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Fetch again, keeping the current data visible until the result arrives.
  ///
  /// A result still pending from an earlier fetch is ignored.
  pub fn refetch(&mut self) {
    self.receiver = None;
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    if self.data().is_none() {
      self.state = QueryState::Loading;
    }
    Self::spawn((self.fetcher)(), tx);
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending
        self.state = QueryState::Error("Query was cancelled".to_string());
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;
    Self::spawn((self.fetcher)(), tx);
  }

  fn spawn(future: BoxFuture<T>, tx: mpsc::UnboundedSender<Result<T, String>>) {
    tokio::spawn(async move {
      // Receiver may have been dropped by a refetch
      let _ = tx.send(future.await);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

/// The mutation record a view renders: status, target and last error.
///
/// One `Mutation` runs at most one operation at a time. `mutate` while
/// pending is refused, which is how views keep the trigger disabled.
pub struct Mutation<T> {
  status: MutationStatus,
  target: Option<String>,
  error: Option<String>,
  receiver: Option<oneshot::Receiver<SyncResult<T>>>,
}

impl<T> Default for Mutation<T> {
  fn default() -> Self {
    Self {
      status: MutationStatus::Idle,
      target: None,
      error: None,
      receiver: None,
    }
  }
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn status(&self) -> MutationStatus {
    self.status
  }

  pub fn is_pending(&self) -> bool {
    self.status.is_pending()
  }

  /// Target of the current or last operation.
  pub fn target(&self) -> Option<&str> {
    self.target.as_deref()
  }

  /// Error from the last failed operation.
  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// Spawn `operation` against `target`. Returns false if still pending.
  pub fn mutate<Fut>(&mut self, target: impl Into<String>, operation: Fut) -> bool
  where
    Fut: Future<Output = SyncResult<T>> + Send + 'static,
  {
    if self.is_pending() {
      return false;
    }

    let (tx, rx) = oneshot::channel();
    self.receiver = Some(rx);
    self.status = MutationStatus::Pending;
    self.target = Some(target.into());
    self.error = None;

    tokio::spawn(async move {
      let _ = tx.send(operation.await);
    });
    true
  }

  /// Check for a settled operation.
  ///
  /// Returns the outcome once, when the operation settles.
  pub fn poll(&mut self) -> Option<SyncResult<T>> {
    let receiver = self.receiver.as_mut()?;

    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(oneshot::error::TryRecvError::Empty) => return None,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.receiver = None;
        self.status = MutationStatus::Error;
        self.error = Some("Mutation was cancelled".to_string());
        return None;
      }
    };

    self.receiver = None;
    match &result {
      Ok(_) => self.status = MutationStatus::Success,
      Err(e) => {
        self.status = MutationStatus::Error;
        self.error = Some(e.to_string());
      }
    }
    Some(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::SyncError;
  use std::time::Duration;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("Failed to fetch todos.".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_error());
    assert_eq!(query.error(), Some("Failed to fetch todos."));
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, String>(42)
    });

    query.fetch();
    query.fetch();
    assert!(query.is_loading());
  }

  #[tokio::test]
  async fn test_refetch_keeps_data_and_ignores_superseded_result() {
    let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, String>(n)
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(50)).await;
    query.poll();
    assert_eq!(query.data(), Some(&0));

    query.refetch();
    query.refetch();
    // Old data stays visible while refetching
    assert_eq!(query.data(), Some(&0));

    tokio::time::sleep(Duration::from_millis(50)).await;
    query.poll();
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_mutation_lifecycle() {
    let mut mutation = Mutation::new();
    assert_eq!(mutation.status(), MutationStatus::Idle);

    let (tx, rx) = oneshot::channel::<()>();
    assert!(mutation.mutate("5", async move {
      let _ = rx.await;
      Ok(5u64)
    }));
    assert!(mutation.is_pending());
    assert_eq!(mutation.target(), Some("5"));

    // Disabled while pending
    assert!(!mutation.mutate("5", async { Ok(6u64) }));
    assert!(mutation.poll().is_none());

    tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(mutation.poll(), Some(Ok(5)));
    assert_eq!(mutation.status(), MutationStatus::Success);
    assert!(mutation.poll().is_none());
  }

  #[tokio::test]
  async fn test_mutation_error_is_recorded() {
    let mut mutation: Mutation<()> = Mutation::new();
    mutation.mutate("new", async {
      Err(SyncError::Validation("Title is required.".to_string()))
    });

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(matches!(mutation.poll(), Some(Err(SyncError::Validation(_)))));
    assert_eq!(mutation.status(), MutationStatus::Error);
    assert_eq!(mutation.error(), Some("Title is required."));

    // A new attempt clears it
    mutation.mutate("new", async { Ok(()) });
    assert!(mutation.error().is_none());
  }
}
