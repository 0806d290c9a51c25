//! Client core for the photo-sharing API.
//!
//! Layers, from the network up:
//! - [`http`]: transport, retry wrapper, single-flight token refresh
//! - [`requests`]: one request builder per endpoint
//! - [`services`]: endpoint calls with error context
//! - [`managers`]: caching, invalidation, loading/error state and events
//! - [`context::Pictura`]: owns all of the above for one session

pub mod cache;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod events;
pub mod http;
pub mod managers;
pub mod models;
pub mod params;
pub mod requests;
pub mod services;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::Pictura;
pub use error::{ApiError, ApiResult, ErrorKind};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
