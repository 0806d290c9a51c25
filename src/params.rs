//! Query parameters shared by the request layer and the cache keys.

use std::collections::BTreeMap;
use std::fmt;

/// Normalized query parameters.
///
/// Kept sorted so two logically equal queries produce equal cache keys no
/// matter the order the caller supplied them in. Empty values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, key: &str, value: impl ToString) -> Self {
    self.insert(key, value);
    self
  }

  pub fn with_opt<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
    if let Some(v) = value {
      self.insert(key, v);
    }
    self
  }

  pub fn insert(&mut self, key: &str, value: impl ToString) {
    let value = value.to_string();
    let value = value.trim();
    if value.is_empty() {
      return;
    }
    self.0.insert(key.to_string(), value.to_string());
  }

  /// Add every pair of `other`, overriding existing keys.
  pub fn merge(mut self, other: &QueryParams) -> Self {
    for (k, v) in &other.0 {
      self.0.insert(k.clone(), v.clone());
    }
    self
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.0.get(key).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

impl fmt::Display for QueryParams {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (k, v) in &self.0 {
      if !first {
        f.write_str("&")?;
      }
      write!(f, "{}={}", k, v)?;
      first = false;
    }
    Ok(())
  }
}

/// Page number and size for paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
  pub page: u32,
  pub page_size: u32,
}

impl PageRequest {
  pub fn new(page: u32, page_size: u32) -> Self {
    Self { page, page_size }
  }

  pub fn first(page_size: u32) -> Self {
    Self::new(1, page_size)
  }

  pub fn to_params(self) -> QueryParams {
    QueryParams::new()
      .with("page", self.page)
      .with("page_size", self.page_size)
  }
}

impl Default for PageRequest {
  fn default() -> Self {
    Self::new(1, 10)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_order_independent_equality() {
    let a = QueryParams::new().with("page", 1).with("ordering", "-likes_count");
    let b = QueryParams::new().with("ordering", "-likes_count").with("page", 1);
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "ordering=-likes_count&page=1");
  }

  #[test]
  fn test_blank_values_dropped() {
    let p = QueryParams::new().with("search", "  ").with_opt::<u32>("page", None);
    assert!(p.is_empty());
  }

  #[test]
  fn test_page_request_params() {
    let p = PageRequest::new(2, 25).to_params();
    assert_eq!(p.get("page"), Some("2"));
    assert_eq!(p.get("page_size"), Some("25"));
  }
}
