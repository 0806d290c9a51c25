use serde_json::{json, Value};

use super::base::{ManagerEvent, ManagerState};
use crate::cache::{CacheKey, CacheLayer, CacheStore};
use crate::error::ApiResult;
use crate::events::{SyncBus, SyncEvent};
use crate::models::{LikeStatus, Page, Photo, ResourceId, Stats};
use crate::services::LikesService;

const STATUS: &str = "like_status";
const PHOTO_LIKES: &str = "photo_likes";
const USER_LIKES: &str = "user_likes";
const RECENT: &str = "recent_likes";
const STATS: &str = "like_stats";
const USER_STATS: &str = "user_like_stats";

pub struct LikesManager {
  service: LikesService,
  sync: SyncBus,
  layer: CacheLayer,
  state: ManagerState,
  status: CacheStore<LikeStatus>,
  likes: CacheStore<Page<Value>>,
  liked_photos: CacheStore<Page<Photo>>,
  stats: CacheStore<Stats>,
}

impl LikesManager {
  pub fn new(service: LikesService, sync: SyncBus, layer: CacheLayer) -> Self {
    Self {
      service,
      sync,
      layer,
      state: ManagerState::new("likes"),
      status: CacheStore::new(),
      likes: CacheStore::new(),
      liked_photos: CacheStore::new(),
      stats: CacheStore::new(),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  /// Flip the like on a photo. The returned status replaces whatever
  /// [`check_like`](Self::check_like) had cached.
  pub async fn toggle_like(&self, photo_id: &ResourceId) -> ApiResult<LikeStatus> {
    self
      .state
      .track(async {
        let status = self.service.toggle_like(photo_id).await?;
        self.status.insert(CacheKey::record(STATUS, photo_id), status);
        self.likes.remove(&CacheKey::record(PHOTO_LIKES, photo_id));
        self.likes.remove(&CacheKey::global(RECENT));
        self.stats.remove(&CacheKey::record(STATS, photo_id));
        // the caller's own liked list and counters
        self.liked_photos.invalidate_kind(USER_LIKES);
        self.stats.invalidate_kind(USER_STATS);

        let payload = json!({
          "photo_id": photo_id,
          "liked": status.liked,
          "likes_count": status.likes_count,
        });
        self.state.emit(ManagerEvent::Updated, payload.clone());
        let event = if status.liked {
          SyncEvent::PhotoLiked
        } else {
          SyncEvent::PhotoUnliked
        };
        self.sync.notify(event, payload.clone());
        self.sync.notify(SyncEvent::LikeToggled, payload);
        Ok(status)
      })
      .await
  }

  pub async fn get_photo_likes(&self, photo_id: &ResourceId) -> ApiResult<Page<Value>> {
    self
      .state
      .cached(
        &self.layer,
        &self.likes,
        CacheKey::record(PHOTO_LIKES, photo_id),
        self.service.get_photo_likes(photo_id),
      )
      .await
  }

  pub async fn get_user_likes(&self, username: &str) -> ApiResult<Page<Photo>> {
    self
      .state
      .cached(
        &self.layer,
        &self.liked_photos,
        CacheKey::record(USER_LIKES, username),
        self.service.get_user_likes(username),
      )
      .await
  }

  pub async fn get_recent(&self) -> ApiResult<Page<Value>> {
    self
      .state
      .cached(&self.layer, &self.likes, CacheKey::global(RECENT), self.service.get_recent())
      .await
  }

  pub async fn get_stats(&self, photo_id: &ResourceId) -> ApiResult<Stats> {
    self
      .state
      .cached(
        &self.layer,
        &self.stats,
        CacheKey::record(STATS, photo_id),
        self.service.get_stats(photo_id),
      )
      .await
  }

  pub async fn get_user_stats(&self, username: &str) -> ApiResult<Stats> {
    self
      .state
      .cached(
        &self.layer,
        &self.stats,
        CacheKey::record(USER_STATS, username),
        self.service.get_user_stats(username),
      )
      .await
  }

  pub async fn check_like(&self, photo_id: &ResourceId) -> ApiResult<LikeStatus> {
    self
      .state
      .cached(
        &self.layer,
        &self.status,
        CacheKey::record(STATUS, photo_id),
        self.service.check_like(photo_id),
      )
      .await
  }

  pub fn reset(&self) {
    self.status.clear();
    self.likes.clear();
    self.liked_photos.clear();
    self.stats.clear();
    self.state.reset();
  }
}
