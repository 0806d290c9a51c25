//! In-memory caching layer for API responses.
//!
//! This module provides the caching mechanism used by every manager:
//! - Structured keys (scope + normalized parameters) instead of joined strings
//! - Cache-first reads with an optional stale time
//! - Scope-indexed invalidation so a mutation can drop every page of a listing

mod key;
mod layer;
mod storage;
mod traits;

pub use key::{CacheKey, Scope};
pub use layer::CacheLayer;
pub use storage::{CacheStore, CachedEntry};
pub use traits::{CacheResult, CacheSource, Cacheable};
