//! In-memory synchronization cache: one shared snapshot per query key.
//!
//! Reads are served from the cached snapshot while it is fresh. A miss, an
//! expired snapshot, or an explicit invalidation hands control to a loader,
//! and concurrent readers of the same key join that single in-flight load
//! instead of issuing their own.
//!
//! Results are applied in the order loads complete. A load that was started
//! before an invalidation still stores its result when it lands, but the
//! snapshot stays marked stale so the next read loads again.

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::traits::{LoadContext, MutationStatus, QueryKey};
use crate::error::{SyncError, SyncResult};

type SharedLoad<V> = Shared<BoxFuture<'static, SyncResult<V>>>;

/// Cached value for one query key.
#[derive(Debug, Clone)]
pub struct Snapshot<V> {
  pub data: V,
  pub fetched_at: DateTime<Utc>,
}

struct InFlight<V> {
  id: u64,
  load: SharedLoad<V>,
}

struct Slot<V> {
  snapshot: Option<Snapshot<V>>,
  stale: bool,
  /// Number of explicit invalidations since the cache was created
  epoch: u64,
  in_flight: Option<InFlight<V>>,
}

impl<V> Default for Slot<V> {
  fn default() -> Self {
    Self {
      snapshot: None,
      stale: false,
      epoch: 0,
      in_flight: None,
    }
  }
}

struct State<V> {
  slots: HashMap<String, Slot<V>>,
  mutations: HashSet<String>,
  next_load_id: u64,
}

impl<V> Default for State<V> {
  fn default() -> Self {
    Self {
      slots: HashMap::new(),
      mutations: HashSet::new(),
      next_load_id: 0,
    }
  }
}

fn lock<V>(state: &Mutex<State<V>>) -> MutexGuard<'_, State<V>> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keyed cache of query results and pending mutation targets.
///
/// Cloning is cheap and every clone shares the same snapshots.
pub struct SyncCache<K, V> {
  state: Arc<Mutex<State<V>>>,
  /// How long before cached data is considered stale
  stale_time: Duration,
  _key: PhantomData<fn() -> K>,
}

impl<K, V> SyncCache<K, V>
where
  K: QueryKey,
  V: Clone + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      state: Arc::new(Mutex::new(State::default())),
      stale_time: Duration::minutes(5),
      _key: PhantomData,
    }
  }

  /// Set the staleness window for cached snapshots.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn is_expired(&self, fetched_at: DateTime<Utc>) -> bool {
    Utc::now() - fetched_at >= self.stale_time
  }

  /// Return the snapshot for `key`, loading it through `loader` when needed.
  ///
  /// 1. Fresh snapshot (not invalidated, inside the staleness window) - return it
  /// 2. A load for this key is already running - wait for that one
  /// 3. Otherwise start `loader` and store its result
  ///
  /// A failed load leaves whatever snapshot was there before untouched.
  pub async fn query<F, Fut>(&self, key: &K, loader: F) -> SyncResult<V>
  where
    F: FnOnce(LoadContext) -> Fut,
    Fut: Future<Output = SyncResult<V>> + Send + 'static,
  {
    let hash = key.cache_hash();

    let load = {
      let mut guard = lock(&self.state);
      let state = &mut *guard;
      let slot = state.slots.entry(hash.clone()).or_default();

      if let Some(snapshot) = &slot.snapshot {
        if !slot.stale && !self.is_expired(snapshot.fetched_at) {
          debug!(query = %key.description(), "cache hit");
          return Ok(snapshot.data.clone());
        }
      }

      let joined = slot.in_flight.as_ref().map(|f| f.load.clone());
      match joined {
        Some(load) => {
          debug!(query = %key.description(), "joining in-flight load");
          load
        }
        None => {
          let id = state.next_load_id;
          state.next_load_id += 1;

          let context = LoadContext {
            invalidated: slot.epoch > 0,
          };
          debug!(query = %key.description(), ?context, "starting load");

          let load = Self::settle(
            Arc::clone(&self.state),
            hash,
            key.description(),
            id,
            slot.epoch,
            loader(context),
          )
          .boxed()
          .shared();

          slot.in_flight = Some(InFlight {
            id,
            load: load.clone(),
          });
          load
        }
      }
    };

    load.await
  }

  /// Wrap a loader future so its result is written back when it completes,
  /// whichever reader happens to drive it.
  async fn settle<Fut>(
    state: Arc<Mutex<State<V>>>,
    hash: String,
    description: String,
    id: u64,
    epoch: u64,
    load: Fut,
  ) -> SyncResult<V>
  where
    Fut: Future<Output = SyncResult<V>> + Send + 'static,
  {
    let result = load.await;

    {
      let mut guard = lock(&state);
      let slot = guard.slots.entry(hash).or_default();

      if slot.in_flight.as_ref().is_some_and(|f| f.id == id) {
        slot.in_flight = None;
      }

      match &result {
        Ok(data) => {
          slot.snapshot = Some(Snapshot {
            data: data.clone(),
            fetched_at: Utc::now(),
          });
          // Invalidated while loading: keep the data but load again next time
          slot.stale = slot.epoch != epoch;
        }
        Err(e) => {
          warn!(query = %description, error = %e, "load failed, keeping previous snapshot");
        }
      }
    }

    result
  }

  /// Mark the snapshot for `key` stale so the next read loads it again.
  ///
  /// A load already in flight keeps its promise to current readers but is no
  /// longer joined by new ones.
  pub fn invalidate(&self, key: &K) {
    let mut state = lock(&self.state);
    let slot = state.slots.entry(key.cache_hash()).or_default();
    slot.epoch += 1;
    slot.stale = true;
    slot.in_flight = None;
    debug!(query = %key.description(), epoch = slot.epoch, "invalidated");
  }

  /// Whether `key` was explicitly invalidated since this cache was created.
  #[cfg(test)]
  pub fn was_invalidated(&self, key: &K) -> bool {
    let state = lock(&self.state);
    state
      .slots
      .get(&key.cache_hash())
      .is_some_and(|slot| slot.epoch > 0)
  }

  /// Current snapshot data for `key` without triggering a load.
  #[cfg(test)]
  pub fn get_query_data(&self, key: &K) -> Option<V> {
    let state = lock(&self.state);
    state
      .slots
      .get(&key.cache_hash())
      .and_then(|slot| slot.snapshot.as_ref())
      .map(|snapshot| snapshot.data.clone())
  }

  /// Replace the snapshot for `key` with `update(current)`.
  ///
  /// Used to apply a result the server already confirmed. The staleness flag
  /// is left as it was.
  pub fn set_query_data<F>(&self, key: &K, update: F)
  where
    F: FnOnce(Option<V>) -> V,
  {
    let mut state = lock(&self.state);
    let slot = state.slots.entry(key.cache_hash()).or_default();
    let current = slot.snapshot.take().map(|s| s.data);
    slot.snapshot = Some(Snapshot {
      data: update(current),
      fetched_at: Utc::now(),
    });
  }

  /// Run one create/update/delete against `target`.
  ///
  /// A second mutation on the same target before the first settles is
  /// rejected with [`SyncError::MutationInProgress`]. On success every key in
  /// `affected` is invalidated; on failure the cache is left untouched and the
  /// error is returned.
  pub async fn run_mutation<T, Fut>(
    &self,
    target: &str,
    affected: &[K],
    operation: Fut,
  ) -> SyncResult<T>
  where
    Fut: Future<Output = SyncResult<T>>,
  {
    let _pending = PendingMutation::begin(Arc::clone(&self.state), target)?;

    let result = operation.await;

    match &result {
      Ok(_) => {
        debug!(mutation = target, "mutation succeeded");
        for key in affected {
          self.invalidate(key);
        }
      }
      Err(e) => warn!(mutation = target, error = %e, "mutation failed"),
    }

    result
  }

  /// Status of the mutation record for `target`.
  pub fn mutation_status(&self, target: &str) -> MutationStatus {
    if lock(&self.state).mutations.contains(target) {
      MutationStatus::Pending
    } else {
      MutationStatus::Idle
    }
  }
}

impl<K, V> SyncCache<K, Vec<V>>
where
  K: QueryKey,
  V: Clone + Send + Sync + 'static,
{
  /// Prepend `item` to the collection cached under `key`, without a round trip.
  pub fn optimistic_insert(&self, key: &K, item: V) {
    debug!(query = %key.description(), "inserting confirmed item");
    self.set_query_data(key, |current| {
      let mut items = current.unwrap_or_default();
      items.insert(0, item);
      items
    });
  }
}

impl<K, V> Default for SyncCache<K, V>
where
  K: QueryKey,
  V: Clone + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<K, V> Clone for SyncCache<K, V> {
  fn clone(&self) -> Self {
    Self {
      state: Arc::clone(&self.state),
      stale_time: self.stale_time,
      _key: PhantomData,
    }
  }
}

/// Pending mutation record; removed when dropped, i.e. once the mutation settles.
struct PendingMutation<V> {
  state: Arc<Mutex<State<V>>>,
  target: String,
}

impl<V> PendingMutation<V> {
  fn begin(state: Arc<Mutex<State<V>>>, target: &str) -> SyncResult<Self> {
    if !lock(&state).mutations.insert(target.to_string()) {
      return Err(SyncError::MutationInProgress {
        target: target.to_string(),
      });
    }
    Ok(Self {
      state,
      target: target.to_string(),
    })
  }
}

impl<V> Drop for PendingMutation<V> {
  fn drop(&mut self) {
    lock(&self.state).mutations.remove(&self.target);
  }
}
