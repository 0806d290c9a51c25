//! What the cache layer hands back, and what it can index by id.

use chrono::{DateTime, Utc};

use crate::models::{Category, Collection, ResourceId};

/// Records that can seed a per-id cache when they arrive inside a listing.
pub trait Cacheable: Clone {
  fn cache_id(&self) -> ResourceId;
}

impl Cacheable for Collection {
  fn cache_id(&self) -> ResourceId {
    self.id.clone()
  }
}

impl Cacheable for Category {
  fn cache_id(&self) -> ResourceId {
    self.id.clone()
  }
}

/// A value returned by [`CacheLayer::fetch`](super::CacheLayer::fetch).
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// Set only for hits
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }

  pub fn is_hit(&self) -> bool {
    self.source == CacheSource::Cache
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched just now
  Network,
  /// Served from memory without a request
  Cache,
}
