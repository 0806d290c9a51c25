//! State shared by every manager: loading flag, last error, event bus.

use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cache::{CacheKey, CacheLayer, CacheStore};
use crate::error::{ApiError, ApiResult};
use crate::events::{EventBus, Subscription};
use crate::lock;

/// Events a manager publishes on its own bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerEvent {
  /// Payload `true` when the first operation starts, `false` when the last
  /// one finishes
  Loading,
  Error,
  Created,
  Updated,
  Deleted,
  AuthStateChanged,
  Cleared,
}

pub struct ManagerState {
  name: &'static str,
  in_flight: AtomicUsize,
  last_error: Mutex<Option<ApiError>>,
  events: EventBus<ManagerEvent, Value>,
}

impl ManagerState {
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      in_flight: AtomicUsize::new(0),
      last_error: Mutex::new(None),
      events: EventBus::new(),
    }
  }

  /// Run `op` with the loading flag raised.
  ///
  /// The previous error is cleared on entry. A failure is recorded and then
  /// returned unchanged. The flag is lowered on every exit, including when
  /// the returned future is dropped before completing.
  pub async fn track<T, Fut>(&self, op: Fut) -> ApiResult<T>
  where
    Fut: Future<Output = ApiResult<T>>,
  {
    *lock(&self.last_error) = None;
    let _loading = LoadingGuard::enter(self);

    match op.await {
      Ok(value) => Ok(value),
      Err(err) => {
        tracing::debug!(manager = self.name, kind = ?err.kind, "operation failed: {}", err);
        *lock(&self.last_error) = Some(err.clone());
        self.emit(
          ManagerEvent::Error,
          json!({ "message": err.message, "status": err.status }),
        );
        Err(err)
      }
    }
  }

  /// [`track`](Self::track) a cache-first read of `key`.
  pub async fn cached<V, Fut>(
    &self,
    layer: &CacheLayer,
    store: &CacheStore<V>,
    key: CacheKey,
    fetch: Fut,
  ) -> ApiResult<V>
  where
    V: Clone,
    Fut: Future<Output = ApiResult<V>>,
  {
    self
      .track(async move { Ok(layer.fetch(store, key, || fetch).await?.data) })
      .await
  }

  pub fn is_loading(&self) -> bool {
    self.in_flight.load(Ordering::SeqCst) > 0
  }

  pub fn last_error(&self) -> Option<ApiError> {
    lock(&self.last_error).clone()
  }

  pub fn events(&self) -> &EventBus<ManagerEvent, Value> {
    &self.events
  }

  pub fn subscribe<F>(&self, event: ManagerEvent, callback: F) -> Subscription<ManagerEvent, Value>
  where
    F: Fn(&Value) + Send + Sync + 'static,
  {
    self.events.subscribe(event, callback)
  }

  pub fn emit(&self, event: ManagerEvent, payload: Value) {
    self.events.emit(&event, &payload);
  }

  /// Forget the last error and announce the reset. Subscribers stay.
  pub fn reset(&self) {
    *lock(&self.last_error) = None;
    self.emit(ManagerEvent::Cleared, Value::Null);
  }
}

/// Counts an operation as in flight for as long as it lives.
struct LoadingGuard<'a> {
  state: &'a ManagerState,
}

impl<'a> LoadingGuard<'a> {
  fn enter(state: &'a ManagerState) -> Self {
    if state.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
      state.emit(ManagerEvent::Loading, Value::Bool(true));
    }
    Self { state }
  }
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) {
    if self.state.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
      self.state.emit(ManagerEvent::Loading, Value::Bool(false));
    }
  }
}
