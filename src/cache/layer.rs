//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use std::future::Future;

use super::key::CacheKey;
use super::storage::CacheStore;
use super::traits::CacheResult;
use crate::error::ApiResult;

/// Cache-first fetching over a [`CacheStore`].
///
/// By default a cached value stays valid until it is invalidated. With a
/// stale time, older entries are refetched on the next read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheLayer {
  stale_time: Option<Duration>,
}

impl CacheLayer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = Some(stale_time);
    self
  }

  /// Check if cached data is stale based on cached_at timestamp.
  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    match self.stale_time {
      Some(stale_time) => Utc::now() - cached_at > stale_time,
      None => false,
    }
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Check cache - if present and fresh, return it without calling `fetcher`
  /// 2. Otherwise fetch from network
  /// 3. Store the result, replacing any previous entry, and return it
  ///
  /// Fetch errors are returned as-is and leave the cache untouched.
  pub async fn fetch<V, F, Fut>(
    &self,
    store: &CacheStore<V>,
    key: CacheKey,
    fetcher: F,
  ) -> ApiResult<CacheResult<V>>
  where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<V>>,
  {
    if let Some(cached) = store.get(&key) {
      if !self.is_stale(cached.cached_at) {
        tracing::debug!(key = %key, "cache hit");
        return Ok(CacheResult::from_cache(cached.value, cached.cached_at));
      }
      tracing::debug!(key = %key, "cache entry stale");
    } else {
      tracing::debug!(key = %key, "cache miss");
    }

    let data = fetcher().await?;
    store.insert(key, data.clone());
    Ok(CacheResult::from_network(data))
  }
}
