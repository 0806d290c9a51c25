use serde_json::{json, Value};

use super::base::{ManagerEvent, ManagerState};
use crate::cache::{CacheKey, CacheLayer, CacheStore};
use crate::error::ApiResult;
use crate::events::{SyncBus, SyncEvent};
use crate::models::{Download, DownloadLimits, Page, Photo, ResourceId, Stats};
use crate::services::DownloadsService;

const HISTORY: &str = "download_history";
const STATS: &str = "download_stats";
const MOST_DOWNLOADED: &str = "most_downloaded";
const LIMITS: &str = "download_limits";

pub struct DownloadsManager {
  service: DownloadsService,
  sync: SyncBus,
  layer: CacheLayer,
  state: ManagerState,
  history: CacheStore<Page<Download>>,
  stats: CacheStore<Stats>,
  popular: CacheStore<Page<Photo>>,
  limits: CacheStore<DownloadLimits>,
}

impl DownloadsManager {
  pub fn new(service: DownloadsService, sync: SyncBus, layer: CacheLayer) -> Self {
    Self {
      service,
      sync,
      layer,
      state: ManagerState::new("downloads"),
      history: CacheStore::new(),
      stats: CacheStore::new(),
      popular: CacheStore::new(),
      limits: CacheStore::new(),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  pub async fn track_download(&self, photo_id: &ResourceId) -> ApiResult<Download> {
    self
      .state
      .track(async {
        let download = self.service.track_download(photo_id).await?;
        match download.user.as_ref().and_then(|user| user.id()) {
          Some(user_id) => {
            self.history.remove(&CacheKey::record(HISTORY, &user_id));
            self.stats.remove(&CacheKey::record(STATS, &user_id));
          }
          None => self.drop_user_entries(),
        }
        self.drop_shared_entries();

        let payload = serde_json::to_value(&download).unwrap_or(Value::Null);
        self.state.emit(ManagerEvent::Created, payload.clone());
        self.sync.notify(SyncEvent::PhotoDownloaded, payload);
        Ok(download)
      })
      .await
  }

  pub async fn get_history(&self, user_id: &ResourceId) -> ApiResult<Page<Download>> {
    self
      .state
      .cached(
        &self.layer,
        &self.history,
        CacheKey::record(HISTORY, user_id),
        self.service.get_history(user_id),
      )
      .await
  }

  pub async fn get_stats(&self, user_id: &ResourceId) -> ApiResult<Stats> {
    self
      .state
      .cached(
        &self.layer,
        &self.stats,
        CacheKey::record(STATS, user_id),
        self.service.get_stats(user_id),
      )
      .await
  }

  pub async fn get_most_downloaded(&self) -> ApiResult<Page<Photo>> {
    self
      .state
      .cached(
        &self.layer,
        &self.popular,
        CacheKey::global(MOST_DOWNLOADED),
        self.service.get_most_downloaded(),
      )
      .await
  }

  pub async fn check_limits(&self) -> ApiResult<DownloadLimits> {
    self
      .state
      .cached(
        &self.layer,
        &self.limits,
        CacheKey::global(LIMITS),
        self.service.check_limits(),
      )
      .await
  }

  pub async fn remove_by_photo(&self, photo_id: &ResourceId) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.remove_by_photo(photo_id).await?;
        self.drop_user_entries();
        self.drop_shared_entries();
        self
          .state
          .emit(ManagerEvent::Deleted, json!({ "photo_id": photo_id }));
        Ok(())
      })
      .await
  }

  pub fn reset(&self) {
    self.history.clear();
    self.stats.clear();
    self.popular.clear();
    self.limits.clear();
    self.state.reset();
  }

  fn drop_user_entries(&self) {
    self.history.invalidate_kind(HISTORY);
    self.stats.invalidate_kind(STATS);
  }

  fn drop_shared_entries(&self) {
    self.popular.remove(&CacheKey::global(MOST_DOWNLOADED));
    self.limits.remove(&CacheKey::global(LIMITS));
  }
}
