//! Cached todo client that wraps a TodoApi with the synchronization cache
//! and the persisted snapshot.

use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{
  KeyValueStore, LoadContext, MutationStatus, NoopStore, PersistedCache, SqliteStore, SyncCache,
};
use crate::config::Config;
use crate::error::{SyncError, SyncResult};

use super::cache::TodoQueryKey;
use super::client::{TodoApi, TodoClient};
use super::types::{NewTodo, Todo, TodoPatch};

/// Mutation target used for creates, which have no id yet.
pub const CREATE_TARGET: &str = "new";

/// Owner assigned to todos created from this client.
const DEFAULT_USER_ID: u64 = 1;

/// Todo client with the cache in front of it.
///
/// Constructed once per process start; clones share the same caches.
#[derive(Clone)]
pub struct CachedTodoClient<A: TodoApi = TodoClient> {
  api: A,
  lists: SyncCache<TodoQueryKey, Vec<Todo>>,
  details: SyncCache<TodoQueryKey, Todo>,
  persisted: PersistedCache<Todo>,
}

impl CachedTodoClient<TodoClient> {
  /// Create the client and open the persisted store described by `config`.
  pub fn new(config: &Config) -> Result<Self> {
    let api = TodoClient::new(config).map_err(|e| eyre!("Failed to create todo client: {}", e))?;
    let store = open_store(config)?;
    Ok(Self::with_parts(api, store, config.stale_time()))
  }
}

/// Open the durable store, or a no-op one when persistence is off.
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
  if !config.cache.persist {
    return Ok(Arc::new(NoopStore));
  }
  let store = SqliteStore::open(config.cache.path.as_deref())
    .map_err(|e| eyre!("Failed to open todo cache: {}", e))?;
  Ok(Arc::new(store))
}

impl<A: TodoApi> CachedTodoClient<A> {
  pub fn with_parts(api: A, store: Arc<dyn KeyValueStore>, stale_time: Duration) -> Self {
    Self {
      api,
      lists: SyncCache::new().with_stale_time(stale_time),
      details: SyncCache::new().with_stale_time(stale_time),
      persisted: PersistedCache::new(store, &TodoQueryKey::All),
    }
  }

  /// The whole collection.
  ///
  /// 1. Fresh in-memory snapshot - returned as is
  /// 2. Persisted snapshot, unless the list was invalidated since start
  /// 3. Network, storing the result in memory and on disk
  pub async fn list_todos(&self) -> SyncResult<Vec<Todo>> {
    let api = self.api.clone();
    let persisted = self.persisted.clone();

    self
      .lists
      .query(&TodoQueryKey::All, move |ctx| load_list(api, persisted, ctx))
      .await
  }

  /// A single todo by id. Detail reads are not persisted.
  pub async fn get_todo(&self, id: u64) -> SyncResult<Todo> {
    let api = self.api.clone();
    self
      .details
      .query(&TodoQueryKey::Detail { id }, move |_| async move {
        api.get(id).await.map_err(SyncError::from)
      })
      .await
  }

  /// Create a todo and put the server's copy at the front of the cached list.
  pub async fn create_todo(&self, title: &str) -> SyncResult<Todo> {
    let todo = NewTodo {
      title: validate_title(title)?,
      completed: false,
      user_id: DEFAULT_USER_ID,
    };

    let created = self
      .lists
      .run_mutation(CREATE_TARGET, &[], async {
        self.api.create(&todo).await.map_err(SyncError::from)
      })
      .await?;

    // The response is the canonical item, so this is a patch rather than a guess
    self.lists.optimistic_insert(&TodoQueryKey::All, created.clone());
    info!(id = created.id, "Created todo");
    Ok(created)
  }

  /// Apply `patch` to todo `id`, then mark the list and the detail stale.
  pub async fn update_todo(&self, id: u64, patch: TodoPatch) -> SyncResult<Todo> {
    let patch = TodoPatch {
      title: patch.title.as_deref().map(validate_title).transpose()?,
      ..patch
    };

    let updated = self
      .lists
      .run_mutation(&mutation_target(id), &[TodoQueryKey::All], async {
        self.api.update(id, &patch).await.map_err(SyncError::from)
      })
      .await?;

    self.details.invalidate(&TodoQueryKey::Detail { id });
    info!(id, "Updated todo");
    Ok(updated)
  }

  /// Delete todo `id`, then mark the list and the detail stale.
  pub async fn delete_todo(&self, id: u64) -> SyncResult<()> {
    self
      .lists
      .run_mutation(&mutation_target(id), &[TodoQueryKey::All], async {
        self.api.delete(id).await.map_err(SyncError::from)
      })
      .await?;

    self.details.invalidate(&TodoQueryKey::Detail { id });
    info!(id, "Deleted todo");
    Ok(())
  }

  /// Drop the persisted snapshot and force the next list read to the network.
  pub fn refresh(&self) -> SyncResult<()> {
    self.persisted.clear()?;
    self.lists.invalidate(&TodoQueryKey::All);
    info!("Cleared persisted todos");
    Ok(())
  }

  /// Whether a persisted snapshot currently exists.
  pub fn has_persisted(&self) -> bool {
    self.persisted.exists().unwrap_or_else(|e| {
      warn!(error = %e, "Failed to check persisted todos");
      false
    })
  }

  /// Pending state of the mutation record for todo `id`.
  pub fn mutation_status(&self, id: u64) -> MutationStatus {
    self.lists.mutation_status(&mutation_target(id))
  }

  /// Pending state of the create mutation.
  pub fn create_status(&self) -> MutationStatus {
    self.lists.mutation_status(CREATE_TARGET)
  }
}

/// Loader for the collection: persisted snapshot first, then the network.
async fn load_list<A: TodoApi>(
  api: A,
  persisted: PersistedCache<Todo>,
  ctx: LoadContext,
) -> SyncResult<Vec<Todo>> {
  if !ctx.invalidated {
    match persisted.load() {
      Ok(Some(snapshot)) => {
        info!(count = snapshot.items.len(), "Loaded todos from persisted cache");
        return Ok(snapshot.items);
      }
      Ok(None) => {}
      Err(e) => warn!(error = %e, "Failed to read persisted todos, fetching instead"),
    }
  }

  let todos = api.list().await?;
  if let Err(e) = persisted.save(&todos) {
    warn!(error = %e, "Failed to persist fetched todos");
  }
  info!(count = todos.len(), "Fetched todos from API and cached");
  Ok(todos)
}

/// Mutation target for todo `id`; the same string as its cache key.
fn mutation_target(id: u64) -> String {
  id.to_string()
}

/// Reject empty titles before any network call.
pub fn validate_title(title: &str) -> SyncResult<String> {
  let title = title.trim();
  if title.is_empty() {
    return Err(SyncError::Validation("Title is required.".to_string()));
  }
  Ok(title.to_string())
}
