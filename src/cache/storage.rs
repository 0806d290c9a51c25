//! In-memory cache storage with a scope index.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::key::{CacheKey, Scope};
use super::traits::Cacheable;
use crate::lock;

/// A single cached value.
#[derive(Debug, Clone)]
pub struct CachedEntry<T> {
  pub value: T,
  /// When the value was stored
  pub cached_at: DateTime<Utc>,
}

struct StoreInner<V> {
  entries: HashMap<CacheKey, CachedEntry<V>>,
  /// scope -> keys stored under it, so invalidating a scope needs no scan
  index: HashMap<Scope, HashSet<CacheKey>>,
}

/// Map from [`CacheKey`] to the last fetched value.
///
/// Entries are only ever replaced whole or removed, never patched.
pub struct CacheStore<V> {
  inner: Mutex<StoreInner<V>>,
}

impl<V> Default for CacheStore<V> {
  fn default() -> Self {
    Self {
      inner: Mutex::new(StoreInner {
        entries: HashMap::new(),
        index: HashMap::new(),
      }),
    }
  }
}

impl<V: Clone> CacheStore<V> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &CacheKey) -> Option<CachedEntry<V>> {
    lock(&self.inner).entries.get(key).cloned()
  }

  pub fn get_value(&self, key: &CacheKey) -> Option<V> {
    self.get(key).map(|entry| entry.value)
  }

  pub fn contains(&self, key: &CacheKey) -> bool {
    lock(&self.inner).entries.contains_key(key)
  }

  pub fn insert(&self, key: CacheKey, value: V) {
    self.insert_at(key, value, Utc::now());
  }

  pub(crate) fn insert_at(&self, key: CacheKey, value: V, cached_at: DateTime<Utc>) {
    let mut inner = lock(&self.inner);
    inner
      .index
      .entry(key.scope().clone())
      .or_default()
      .insert(key.clone());
    inner.entries.insert(
      key,
      CachedEntry { value, cached_at },
    );
  }

  pub fn remove(&self, key: &CacheKey) -> bool {
    let mut inner = lock(&self.inner);
    let removed = inner.entries.remove(key).is_some();
    if let Some(keys) = inner.index.get_mut(key.scope()) {
      keys.remove(key);
      if keys.is_empty() {
        inner.index.remove(key.scope());
      }
    }
    removed
  }

  /// Remove every entry stored under `scope`. Returns how many were removed.
  pub fn invalidate_scope(&self, scope: &Scope) -> usize {
    let mut inner = lock(&self.inner);
    let Some(keys) = inner.index.remove(scope) else {
      return 0;
    };
    for key in &keys {
      inner.entries.remove(key);
    }
    keys.len()
  }

  /// Remove every entry whose scope has the given kind, whatever its id.
  pub fn invalidate_kind(&self, kind: &str) -> usize {
    let mut inner = lock(&self.inner);
    let scopes: Vec<Scope> = inner
      .index
      .keys()
      .filter(|scope| scope.kind() == kind)
      .cloned()
      .collect();

    let mut removed = 0;
    for scope in scopes {
      if let Some(keys) = inner.index.remove(&scope) {
        for key in &keys {
          inner.entries.remove(key);
        }
        removed += keys.len();
      }
    }
    removed
  }

  pub fn clear(&self) {
    let mut inner = lock(&self.inner);
    inner.entries.clear();
    inner.index.clear();
  }

  pub fn len(&self) -> usize {
    lock(&self.inner).entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<V: Cacheable> CacheStore<V> {
  /// Store each record of a listing under its own `kind` key.
  pub fn seed<'a, I>(&self, kind: &'static str, records: I)
  where
    I: IntoIterator<Item = &'a V>,
    V: 'a,
  {
    for record in records {
      self.insert(CacheKey::record(kind, record.cache_id()), record.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Category;
  use crate::params::PageRequest;

  #[test]
  fn test_insert_replaces_whole_entry() {
    let store = CacheStore::new();
    let key = CacheKey::record("photo", 1);
    store.insert(key.clone(), "v1");
    store.insert(key.clone(), "v2");
    assert_eq!(store.get_value(&key), Some("v2"));
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn test_invalidate_scope_removes_all_pages() {
    let store = CacheStore::new();
    for page in 1..=3 {
      store.insert(CacheKey::page("user_collections", 7, PageRequest::new(page, 10)), page);
    }
    store.insert(CacheKey::page("user_collections", 8, PageRequest::new(1, 10)), 99);

    let removed = store.invalidate_scope(&Scope::of("user_collections", 7));

    assert_eq!(removed, 3);
    assert_eq!(store.len(), 1);
    assert!(store.contains(&CacheKey::page("user_collections", 8, PageRequest::new(1, 10))));
  }

  #[test]
  fn test_invalidate_kind() {
    let store = CacheStore::new();
    store.insert(CacheKey::record("following", "ana"), 1);
    store.insert(CacheKey::record("following", "bo"), 2);
    store.insert(CacheKey::record("followers", "ana"), 3);

    assert_eq!(store.invalidate_kind("following"), 2);
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn test_remove_keeps_index_consistent() {
    let store = CacheStore::new();
    let key = CacheKey::page("photo_comments", 5, PageRequest::new(1, 20));
    store.insert(key.clone(), ());
    assert!(store.remove(&key));
    assert!(!store.remove(&key));
    assert_eq!(store.invalidate_scope(key.scope()), 0);
  }

  #[test]
  fn test_seed_from_listing() {
    let store = CacheStore::new();
    let listing: Vec<Category> =
      serde_json::from_value(serde_json::json!([{"id": 1, "name": "Nature"}, {"id": 2, "name": "City"}])).unwrap();

    store.seed("category", &listing);

    assert_eq!(store.len(), 2);
    assert_eq!(
      store.get_value(&CacheKey::record("category", 2)).map(|c| c.name),
      Some("City".to_string())
    );
  }
}
