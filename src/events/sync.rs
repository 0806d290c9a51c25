//! Application-wide change notifications with per-tick coalescing.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::bus::{EventBus, Subscription};
use crate::lock;

/// Data changes any part of the application may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncEvent {
  PhotoCreated,
  PhotoUpdated,
  PhotoDeleted,
  PhotoLiked,
  PhotoUnliked,
  PhotoDownloaded,
  PhotosLoaded,
  CommentCreated,
  CommentUpdated,
  CommentDeleted,
  LikeToggled,
  CollectionCreated,
  CollectionUpdated,
  CollectionDeleted,
  CollectionItemAdded,
  CollectionItemRemoved,
  CategoryCreated,
  CategoryUpdated,
  CategoryDeleted,
  FollowerAdded,
  FollowerRemoved,
  DownloadStarted,
  DownloadCompleted,
  DownloadFailed,
  UserUpdated,
  UserPreferencesChanged,
  AuthStateChanged,
  /// Credentials were dropped because they could not be refreshed; the user
  /// has to log in again.
  SessionExpired,
}

impl SyncEvent {
  pub fn as_str(&self) -> &'static str {
    match self {
      SyncEvent::PhotoCreated => "photo:created",
      SyncEvent::PhotoUpdated => "photo:updated",
      SyncEvent::PhotoDeleted => "photo:deleted",
      SyncEvent::PhotoLiked => "photo:liked",
      SyncEvent::PhotoUnliked => "photo:unliked",
      SyncEvent::PhotoDownloaded => "photo:downloaded",
      SyncEvent::PhotosLoaded => "photos:loaded",
      SyncEvent::CommentCreated => "comment:created",
      SyncEvent::CommentUpdated => "comment:updated",
      SyncEvent::CommentDeleted => "comment:deleted",
      SyncEvent::LikeToggled => "like:toggled",
      SyncEvent::CollectionCreated => "collection:created",
      SyncEvent::CollectionUpdated => "collection:updated",
      SyncEvent::CollectionDeleted => "collection:deleted",
      SyncEvent::CollectionItemAdded => "collection:item:added",
      SyncEvent::CollectionItemRemoved => "collection:item:removed",
      SyncEvent::CategoryCreated => "category:created",
      SyncEvent::CategoryUpdated => "category:updated",
      SyncEvent::CategoryDeleted => "category:deleted",
      SyncEvent::FollowerAdded => "follower:added",
      SyncEvent::FollowerRemoved => "follower:removed",
      SyncEvent::DownloadStarted => "download:started",
      SyncEvent::DownloadCompleted => "download:completed",
      SyncEvent::DownloadFailed => "download:failed",
      SyncEvent::UserUpdated => "user:updated",
      SyncEvent::UserPreferencesChanged => "user:preferences:changed",
      SyncEvent::AuthStateChanged => "auth:state:changed",
      SyncEvent::SessionExpired => "session:expired",
    }
  }
}

struct SyncInner {
  bus: EventBus<SyncEvent, Value>,
  /// Latest payload per event type, in first-notified order
  pending: Mutex<Vec<(SyncEvent, Value)>>,
  scheduled: AtomicBool,
}

impl SyncInner {
  fn flush(&self) -> usize {
    self.scheduled.store(false, Ordering::SeqCst);
    let batch = std::mem::take(&mut *lock(&self.pending));
    let count = batch.len();
    for (event, payload) in batch {
      self.bus.emit(&event, &payload);
    }
    count
  }
}

/// Cross-cutting notification bus.
///
/// Notifications are not delivered immediately: repeated notifications of
/// the same event type before the next scheduling tick collapse into one
/// delivery carrying the latest payload.
#[derive(Clone)]
pub struct SyncBus {
  inner: Arc<SyncInner>,
}

impl Default for SyncBus {
  fn default() -> Self {
    Self::new()
  }
}

impl SyncBus {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(SyncInner {
        bus: EventBus::new(),
        pending: Mutex::new(Vec::new()),
        scheduled: AtomicBool::new(false),
      }),
    }
  }

  pub fn subscribe<F>(&self, event: SyncEvent, callback: F) -> Subscription<SyncEvent, Value>
  where
    F: Fn(&Value) + Send + Sync + 'static,
  {
    self.inner.bus.subscribe(event, callback)
  }

  pub fn notify(&self, event: SyncEvent, payload: Value) {
    {
      let mut pending = lock(&self.inner.pending);
      match pending.iter_mut().find(|(e, _)| *e == event) {
        Some(slot) => slot.1 = payload,
        None => pending.push((event, payload)),
      }
    }

    if self.inner.scheduled.swap(true, Ordering::SeqCst) {
      return;
    }

    match tokio::runtime::Handle::try_current() {
      Ok(handle) => {
        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
          tokio::task::yield_now().await;
          inner.flush();
        });
      }
      // Outside a runtime there is no tick to wait for.
      Err(_) => {
        self.inner.flush();
      }
    }
  }

  /// Deliver everything pending right now. Returns the number of
  /// deliveries.
  pub fn flush(&self) -> usize {
    self.inner.flush()
  }

  pub fn pending_len(&self) -> usize {
    lock(&self.inner.pending).len()
  }

  /// Handle that does not keep the bus alive, for callbacks registered on
  /// this same bus.
  pub fn downgrade(&self) -> WeakSyncBus {
    WeakSyncBus {
      inner: Arc::downgrade(&self.inner),
    }
  }
}

#[derive(Clone)]
pub struct WeakSyncBus {
  inner: Weak<SyncInner>,
}

impl WeakSyncBus {
  pub fn upgrade(&self) -> Option<SyncBus> {
    self.inner.upgrade().map(|inner| SyncBus { inner })
  }
}
