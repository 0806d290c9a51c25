//! Resource records as returned by the API.
//!
//! Every record keeps the fields the client actually reads as typed fields
//! and carries whatever else the server sent in a flattened `extra` map, so
//! a cached record is always a full snapshot of the response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Server identifiers are integers for most resources and strings (UUIDs,
/// usernames) for others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
  Int(u64),
  Str(String),
}

impl fmt::Display for ResourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResourceId::Int(n) => write!(f, "{}", n),
      ResourceId::Str(s) => f.write_str(s),
    }
  }
}

impl From<u64> for ResourceId {
  fn from(value: u64) -> Self {
    ResourceId::Int(value)
  }
}

impl From<&str> for ResourceId {
  fn from(value: &str) -> Self {
    match value.parse::<u64>() {
      Ok(n) => ResourceId::Int(n),
      Err(_) => ResourceId::Str(value.to_string()),
    }
  }
}

impl From<String> for ResourceId {
  fn from(value: String) -> Self {
    ResourceId::from(value.as_str())
  }
}

/// Compact user representation embedded in other records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
  pub id: Option<ResourceId>,
  pub username: Option<String>,
  pub profile_picture: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Reference to the owning user. Depending on the endpoint the server sends
/// a nested object, a primary key, or a username string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
  Summary(UserSummary),
  Id(ResourceId),
}

impl UserRef {
  /// Numeric user id, when the reference carries one. A bare string is the
  /// user's display form and says nothing about the id.
  pub fn id(&self) -> Option<ResourceId> {
    match self {
      UserRef::Summary(user) => user.id.clone(),
      UserRef::Id(ResourceId::Int(id)) => Some(ResourceId::Int(*id)),
      UserRef::Id(ResourceId::Str(_)) => None,
    }
  }

  /// Username, only known from a nested summary.
  pub fn username(&self) -> Option<&str> {
    match self {
      UserRef::Summary(user) => user.username.as_deref(),
      UserRef::Id(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
  pub id: ResourceId,
  pub user: Option<UserRef>,
  #[serde(default)]
  pub title: String,
  pub description: Option<String>,
  pub image: Option<String>,
  #[serde(default)]
  pub likes_count: u64,
  #[serde(default)]
  pub comments_count: u64,
  #[serde(default)]
  pub downloads_count: u64,
  pub upload_date: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id: ResourceId,
  pub user: Option<UserRef>,
  pub photo: Option<ResourceId>,
  #[serde(default)]
  pub comment_text: String,
  pub created_at: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
  pub id: ResourceId,
  pub user: Option<UserRef>,
  #[serde(default)]
  pub name: String,
  pub description: Option<String>,
  #[serde(default)]
  pub likes_count: u64,
  #[serde(default)]
  pub followers_count: u64,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id: ResourceId,
  #[serde(default)]
  pub name: String,
  pub image: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: Option<ResourceId>,
  pub username: String,
  pub email: Option<String>,
  pub full_name: Option<String>,
  pub bio: Option<String>,
  pub about: Option<String>,
  pub contact: Option<String>,
  pub profile_picture: Option<String>,
  #[serde(default)]
  pub followers_count: u64,
  #[serde(default)]
  pub following_count: u64,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Download {
  pub id: ResourceId,
  pub user: Option<UserRef>,
  pub photo: Option<Value>,
  pub downloaded_at: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub id: ResourceId,
  #[serde(default)]
  pub read: bool,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
  #[serde(default)]
  pub liked: bool,
  pub likes_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStatus {
  #[serde(default)]
  pub following: bool,
  pub followers_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLimits {
  pub can_download: Option<bool>,
  pub remaining: Option<u64>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Statistics endpoints return free-form objects.
pub type Stats = Value;

/// Response of the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
  pub access: String,
  pub refresh: String,
}

/// Response of the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
  pub access: String,
}

/// A page of results.
///
/// Paginated endpoints answer with `{count, next, previous, results}`, a few
/// others with a bare array; both deserialize into a `Page`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
  pub count: u64,
  pub next: Option<String>,
  pub previous: Option<String>,
  pub results: Vec<T>,
}

impl<T> Page<T> {
  pub fn has_next(&self) -> bool {
    self.next.is_some()
  }
}

impl<T> Default for Page<T> {
  fn default() -> Self {
    Self {
      count: 0,
      next: None,
      previous: None,
      results: Vec::new(),
    }
  }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
      Paginated {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
      },
      Bare(Vec<T>),
    }

    Ok(match Repr::deserialize(deserializer)? {
      Repr::Paginated {
        count,
        next,
        previous,
        results,
      } => Page {
        count: count.unwrap_or(results.len() as u64),
        next,
        previous,
        results,
      },
      Repr::Bare(results) => Page {
        count: results.len() as u64,
        next: None,
        previous: None,
        results,
      },
    })
  }
}
