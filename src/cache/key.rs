//! Structured cache keys.

use std::fmt;

use crate::params::{PageRequest, QueryParams};

/// What a cached value belongs to: a kind of query plus, optionally, the
/// record the query is scoped to (a user, a photo, a collection).
///
/// Invalidation works on scopes: dropping `Scope::of("user_collections", 7)`
/// removes every page and filter variant cached for user 7.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
  kind: &'static str,
  id: Option<String>,
}

impl Scope {
  pub fn of(kind: &'static str, id: impl fmt::Display) -> Self {
    Self {
      kind,
      id: Some(id.to_string()),
    }
  }

  /// A scope not tied to any record (feed, recent likes, featured).
  pub fn global(kind: &'static str) -> Self {
    Self { kind, id: None }
  }

  pub fn kind(&self) -> &'static str {
    self.kind
  }

  pub fn id(&self) -> Option<&str> {
    self.id.as_deref()
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.id {
      Some(id) => write!(f, "{}/{}", self.kind, id),
      None => f.write_str(self.kind),
    }
  }
}

/// Scope plus the normalized parameters of the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
  scope: Scope,
  params: QueryParams,
}

impl CacheKey {
  pub fn new(scope: Scope, params: QueryParams) -> Self {
    Self { scope, params }
  }

  /// Key for a single record.
  pub fn record(kind: &'static str, id: impl fmt::Display) -> Self {
    Self::new(Scope::of(kind, id), QueryParams::new())
  }

  /// Key for one page of a scoped listing.
  pub fn page(kind: &'static str, id: impl fmt::Display, page: PageRequest) -> Self {
    Self::new(Scope::of(kind, id), page.to_params())
  }

  pub fn global(kind: &'static str) -> Self {
    Self::new(Scope::global(kind), QueryParams::new())
  }

  pub fn scope(&self) -> &Scope {
    &self.scope
  }

  pub fn params(&self) -> &QueryParams {
    &self.params
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.params.is_empty() {
      write!(f, "{}", self.scope)
    } else {
      write!(f, "{}?{}", self.scope, self.params)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pages_do_not_collide() {
    let a = CacheKey::page("user_collections", 7, PageRequest::new(1, 10));
    let b = CacheKey::page("user_collections", 7, PageRequest::new(2, 10));
    assert_ne!(a, b);
    assert_eq!(a.scope(), b.scope());
  }

  #[test]
  fn test_ids_containing_delimiters_do_not_collide() {
    // "1-2" page 3 vs "1" page "2-3" would collide with a joined string key
    let a = CacheKey::new(Scope::of("x", "1-2"), QueryParams::new().with("page", "3"));
    let b = CacheKey::new(Scope::of("x", "1"), QueryParams::new().with("page", "2-3"));
    assert_ne!(a, b);
  }

  #[test]
  fn test_display() {
    let key = CacheKey::page("photo_comments", 5, PageRequest::new(1, 20));
    assert_eq!(key.to_string(), "photo_comments/5?page=1&page_size=20");
    assert_eq!(CacheKey::global("feed").to_string(), "feed");
  }
}
