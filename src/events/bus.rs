//! Synchronous publish/subscribe keyed by event name.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use crate::lock;

type Callback<P> = Arc<dyn Fn(&P) + Send + Sync>;

struct Listeners<K, P> {
  next_id: u64,
  by_key: HashMap<K, Vec<(u64, Callback<P>)>>,
}

/// Event bus delivering payloads of type `P` to callbacks registered per key.
///
/// Delivery is synchronous and goes to a snapshot of the subscribers taken
/// at emit time, so callbacks may subscribe or unsubscribe freely. A callback
/// that panics is logged and skipped; the remaining callbacks still run and
/// the emitter never sees the panic.
pub struct EventBus<K, P> {
  listeners: Arc<Mutex<Listeners<K, P>>>,
}

impl<K, P> Clone for EventBus<K, P> {
  fn clone(&self) -> Self {
    Self {
      listeners: Arc::clone(&self.listeners),
    }
  }
}

impl<K, P> Default for EventBus<K, P> {
  fn default() -> Self {
    Self {
      listeners: Arc::new(Mutex::new(Listeners {
        next_id: 0,
        by_key: HashMap::new(),
      })),
    }
  }
}

impl<K, P> EventBus<K, P>
where
  K: Eq + Hash + Clone + Debug + Send + 'static,
  P: 'static,
{
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe<F>(&self, key: K, callback: F) -> Subscription<K, P>
  where
    F: Fn(&P) + Send + Sync + 'static,
  {
    let mut listeners = lock(&self.listeners);
    let id = listeners.next_id;
    listeners.next_id += 1;
    listeners
      .by_key
      .entry(key.clone())
      .or_default()
      .push((id, Arc::new(callback)));

    Subscription {
      key,
      id,
      listeners: Arc::downgrade(&self.listeners),
    }
  }

  /// Deliver `payload` to every subscriber of `key`. Returns how many
  /// callbacks completed without panicking.
  pub fn emit(&self, key: &K, payload: &P) -> usize {
    let callbacks: Vec<Callback<P>> = match lock(&self.listeners).by_key.get(key) {
      Some(entries) => entries.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
      None => return 0,
    };

    let mut delivered = 0;
    for callback in callbacks {
      match catch_unwind(AssertUnwindSafe(|| callback(payload))) {
        Ok(()) => delivered += 1,
        Err(panic) => {
          let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
          tracing::error!(event = ?key, "event listener panicked: {}", reason);
        }
      }
    }
    delivered
  }

  pub fn listener_count(&self, key: &K) -> usize {
    lock(&self.listeners)
      .by_key
      .get(key)
      .map_or(0, Vec::len)
  }

  /// Drop every subscriber.
  pub fn clear(&self) {
    lock(&self.listeners).by_key.clear();
  }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription<K, P> {
  key: K,
  id: u64,
  listeners: Weak<Mutex<Listeners<K, P>>>,
}

impl<K: Eq + Hash, P> Subscription<K, P> {
  pub fn unsubscribe(self) {
    let Some(listeners) = self.listeners.upgrade() else {
      return;
    };
    let mut listeners = lock(&listeners);
    if let Some(entries) = listeners.by_key.get_mut(&self.key) {
      entries.retain(|(id, _)| *id != self.id);
      if entries.is_empty() {
        listeners.by_key.remove(&self.key);
      }
    }
  }
}
