//! Request builders, one function per endpoint.
//!
//! Builders only describe the request; they never send anything. Paths are
//! relative to the configured API base URL.

pub mod auth;
pub mod categories;
pub mod collections;
pub mod comments;
pub mod downloads;
pub mod followers;
pub mod likes;
pub mod photos;
pub mod users;

use std::fmt::Display;

/// Percent-encode `value` for use as a single path segment.
pub(crate) fn segment(value: impl Display) -> String {
  urlencoding::encode(&value.to_string()).into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::ResourceId;

  #[test]
  fn test_segment_escapes_separators() {
    assert_eq!(segment("ana"), "ana");
    assert_eq!(segment(&ResourceId::Int(42)), "42");
    assert_eq!(segment("a/b?c#d"), "a%2Fb%3Fc%23d");
    assert_eq!(users::profile("x/../login").path, "users/x%2F..%2Flogin/");
  }
}
