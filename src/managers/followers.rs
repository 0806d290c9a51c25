use serde_json::json;

use super::base::{ManagerEvent, ManagerState};
use crate::cache::{CacheKey, CacheLayer, CacheStore};
use crate::error::ApiResult;
use crate::events::{SyncBus, SyncEvent};
use crate::models::{FollowStatus, Page, Stats, UserSummary};
use crate::services::FollowersService;

const STATUS: &str = "follow_status";
const FOLLOWERS: &str = "followers";
const FOLLOWING: &str = "following";
const SUGGESTED: &str = "suggested_users";
const STATS: &str = "follower_stats";

pub struct FollowersManager {
  service: FollowersService,
  sync: SyncBus,
  layer: CacheLayer,
  state: ManagerState,
  status: CacheStore<FollowStatus>,
  users: CacheStore<Page<UserSummary>>,
  stats: CacheStore<Stats>,
}

impl FollowersManager {
  pub fn new(service: FollowersService, sync: SyncBus, layer: CacheLayer) -> Self {
    Self {
      service,
      sync,
      layer,
      state: ManagerState::new("followers"),
      status: CacheStore::new(),
      users: CacheStore::new(),
      stats: CacheStore::new(),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  pub async fn toggle_follow(&self, username: &str) -> ApiResult<FollowStatus> {
    self
      .state
      .track(async {
        let status = self.service.toggle_follow(username).await?;
        self.status.insert(CacheKey::record(STATUS, username), status);
        self.users.remove(&CacheKey::record(FOLLOWERS, username));
        self.stats.remove(&CacheKey::record(STATS, username));
        // whose following list changed depends on who is logged in
        self.users.invalidate_kind(FOLLOWING);
        self.users.remove(&CacheKey::global(SUGGESTED));

        let payload = json!({
          "username": username,
          "following": status.following,
          "followers_count": status.followers_count,
        });
        self.state.emit(ManagerEvent::Updated, payload.clone());
        let event = if status.following {
          SyncEvent::FollowerAdded
        } else {
          SyncEvent::FollowerRemoved
        };
        self.sync.notify(event, payload);
        Ok(status)
      })
      .await
  }

  pub async fn get_followers(&self, username: &str) -> ApiResult<Page<UserSummary>> {
    self
      .state
      .cached(
        &self.layer,
        &self.users,
        CacheKey::record(FOLLOWERS, username),
        self.service.get_followers(username),
      )
      .await
  }

  pub async fn get_following(&self, username: &str) -> ApiResult<Page<UserSummary>> {
    self
      .state
      .cached(
        &self.layer,
        &self.users,
        CacheKey::record(FOLLOWING, username),
        self.service.get_following(username),
      )
      .await
  }

  pub async fn get_stats(&self, username: &str) -> ApiResult<Stats> {
    self
      .state
      .cached(
        &self.layer,
        &self.stats,
        CacheKey::record(STATS, username),
        self.service.get_stats(username),
      )
      .await
  }

  pub async fn check_follow(&self, username: &str) -> ApiResult<FollowStatus> {
    self
      .state
      .cached(
        &self.layer,
        &self.status,
        CacheKey::record(STATUS, username),
        self.service.check_follow(username),
      )
      .await
  }

  pub async fn get_suggested_users(&self) -> ApiResult<Page<UserSummary>> {
    self
      .state
      .cached(
        &self.layer,
        &self.users,
        CacheKey::global(SUGGESTED),
        self.service.get_suggested_users(),
      )
      .await
  }

  pub fn reset(&self) {
    self.status.clear();
    self.users.clear();
    self.stats.clear();
    self.state.reset();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::session_for;
  use std::sync::{Arc, Mutex};
  use wiremock::matchers::{body_json, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_follow_updates_status_and_drops_lists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/followers/toggle_follow/"))
      .and(body_json(json!({"username": "bea"})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"following": true, "followers_count": 12})))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/followers/followers/"))
      .and(query_param("username", "bea"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/followers/following/"))
      .and(query_param("username", "ana"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/followers/check_follow/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"following": false})))
      .expect(1)
      .mount(&server)
      .await;

    let client = session_for(&server);
    let sync = client.sync().clone();
    let followers = FollowersManager::new(FollowersService::new(client.clone()), sync.clone(), CacheLayer::new());
    let added = Arc::new(Mutex::new(0));
    let a = added.clone();
    sync.subscribe(SyncEvent::FollowerAdded, move |_| *a.lock().unwrap() += 1);

    assert!(!followers.check_follow("bea").await.unwrap().following);
    followers.get_followers("bea").await.unwrap();
    followers.get_following("ana").await.unwrap();

    let status = followers.toggle_follow("bea").await.unwrap();
    assert_eq!(status.followers_count, Some(12));
    assert!(followers.check_follow("bea").await.unwrap().following);

    followers.get_followers("bea").await.unwrap();
    followers.get_following("ana").await.unwrap();
    sync.flush();
    assert_eq!(*added.lock().unwrap(), 1);
  }
}
