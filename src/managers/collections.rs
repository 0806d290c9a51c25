use serde_json::{json, Value};

use super::base::{ManagerEvent, ManagerState};
use crate::cache::{CacheKey, CacheLayer, CacheStore, Scope};
use crate::error::ApiResult;
use crate::events::{SyncBus, SyncEvent};
use crate::models::{Collection, FollowStatus, LikeStatus, Page, Photo, ResourceId, Stats, UserRef};
use crate::params::PageRequest;
use crate::requests::collections::CollectionForm;
use crate::services::CollectionsService;

const RECORD: &str = "collection";
const BY_USER: &str = "user_collections";
const PHOTOS: &str = "collection_photos";
const STATS: &str = "collection_stats";
const FEATURED: &str = "featured_collections";
const TRENDING: &str = "trending_collections";

pub struct CollectionsManager {
  service: CollectionsService,
  sync: SyncBus,
  layer: CacheLayer,
  state: ManagerState,
  by_id: CacheStore<Collection>,
  lists: CacheStore<Page<Collection>>,
  photos: CacheStore<Page<Photo>>,
  stats: CacheStore<Stats>,
}

impl CollectionsManager {
  pub fn new(service: CollectionsService, sync: SyncBus, layer: CacheLayer) -> Self {
    Self {
      service,
      sync,
      layer,
      state: ManagerState::new("collections"),
      by_id: CacheStore::new(),
      lists: CacheStore::new(),
      photos: CacheStore::new(),
      stats: CacheStore::new(),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  /// One page of a user's collections. Every collection on the page also
  /// lands in the per-id cache.
  pub async fn get_user_collections(
    &self,
    user_id: &ResourceId,
    page: PageRequest,
  ) -> ApiResult<Page<Collection>> {
    let key = CacheKey::page(BY_USER, user_id, page);
    let data = self
      .state
      .cached(
        &self.layer,
        &self.lists,
        key,
        self.service.get_user_collections(user_id, page),
      )
      .await?;
    self.seed(&data);
    Ok(data)
  }

  pub async fn get_collection(&self, id: &ResourceId) -> ApiResult<Collection> {
    self
      .state
      .cached(
        &self.layer,
        &self.by_id,
        CacheKey::record(RECORD, id),
        self.service.get_collection(id),
      )
      .await
  }

  pub async fn create_collection(&self, form: &CollectionForm) -> ApiResult<Collection> {
    self
      .state
      .track(async {
        let collection = self.service.create_collection(form).await?;
        self
          .by_id
          .insert(CacheKey::record(RECORD, &collection.id), collection.clone());
        self.invalidate_owner(&collection);
        self.announce(ManagerEvent::Created, SyncEvent::CollectionCreated, &collection);
        Ok(collection)
      })
      .await
  }

  pub async fn update_collection(&self, id: &ResourceId, form: &CollectionForm) -> ApiResult<Collection> {
    self
      .state
      .track(async {
        let collection = self.service.update_collection(id, form).await?;
        self.by_id.insert(CacheKey::record(RECORD, id), collection.clone());
        self.invalidate_owner(&collection);
        self.announce(ManagerEvent::Updated, SyncEvent::CollectionUpdated, &collection);
        Ok(collection)
      })
      .await
  }

  /// Delete a collection. The collection is looked up first (usually from
  /// the cache) so its owner's listings can be dropped.
  pub async fn delete_collection(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .state
      .track(async {
        let collection = self
          .layer
          .fetch(&self.by_id, CacheKey::record(RECORD, id), || self.service.get_collection(id))
          .await?
          .data;
        self.service.delete_collection(id).await?;
        self.by_id.remove(&CacheKey::record(RECORD, id));
        self.photos.invalidate_scope(&Scope::of(PHOTOS, id));
        self.stats.remove(&CacheKey::record(STATS, id));
        self.invalidate_owner(&collection);
        let payload = json!({ "id": id });
        self.state.emit(ManagerEvent::Deleted, payload.clone());
        self.sync.notify(SyncEvent::CollectionDeleted, payload);
        Ok(())
      })
      .await
  }

  pub async fn add_photos(&self, id: &ResourceId, photo_ids: &[ResourceId]) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.add_photos(id, photo_ids).await?;
        self.invalidate_contents(id);
        self.sync.notify(
          SyncEvent::CollectionItemAdded,
          json!({ "collection_id": id, "photo_ids": photo_ids }),
        );
        Ok(())
      })
      .await
  }

  pub async fn remove_photos(&self, id: &ResourceId, photo_ids: &[ResourceId]) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.remove_photos(id, photo_ids).await?;
        self.invalidate_contents(id);
        self.sync.notify(
          SyncEvent::CollectionItemRemoved,
          json!({ "collection_id": id, "photo_ids": photo_ids }),
        );
        Ok(())
      })
      .await
  }

  /// Toggle the current user's like. The collection's counters change, so
  /// its cached record and stats are dropped.
  pub async fn toggle_like(&self, id: &ResourceId) -> ApiResult<LikeStatus> {
    self
      .state
      .track(async {
        let status = self.service.toggle_like(id).await?;
        self.drop_counters(id);
        self.sync.notify(SyncEvent::CollectionUpdated, json!({ "id": id }));
        Ok(status)
      })
      .await
  }

  pub async fn toggle_follow(&self, id: &ResourceId) -> ApiResult<FollowStatus> {
    self
      .state
      .track(async {
        let status = self.service.toggle_follow(id).await?;
        self.drop_counters(id);
        self.sync.notify(SyncEvent::CollectionUpdated, json!({ "id": id }));
        Ok(status)
      })
      .await
  }

  pub async fn get_featured(&self) -> ApiResult<Page<Collection>> {
    let data = self
      .state
      .cached(
        &self.layer,
        &self.lists,
        CacheKey::global(FEATURED),
        self.service.get_featured(),
      )
      .await?;
    self.seed(&data);
    Ok(data)
  }

  pub async fn get_trending(&self, days: u32) -> ApiResult<Page<Collection>> {
    let data = self
      .state
      .cached(
        &self.layer,
        &self.lists,
        CacheKey::record(TRENDING, days),
        self.service.get_trending(days),
      )
      .await?;
    self.seed(&data);
    Ok(data)
  }

  pub async fn get_stats(&self, id: &ResourceId) -> ApiResult<Stats> {
    self
      .state
      .cached(
        &self.layer,
        &self.stats,
        CacheKey::record(STATS, id),
        self.service.get_stats(id),
      )
      .await
  }

  pub async fn get_collection_photos(&self, id: &ResourceId, page: PageRequest) -> ApiResult<Page<Photo>> {
    self
      .state
      .cached(
        &self.layer,
        &self.photos,
        CacheKey::page(PHOTOS, id, page),
        self.service.get_collection_photos(id, page),
      )
      .await
  }

  pub fn reset(&self) {
    self.by_id.clear();
    self.lists.clear();
    self.photos.clear();
    self.stats.clear();
    self.state.reset();
  }

  fn seed(&self, page: &Page<Collection>) {
    self.by_id.seed(RECORD, &page.results);
  }

  /// Pages are keyed by the owner's numeric id. The collection endpoints
  /// send the owner as a display string, which drops every user's pages.
  fn invalidate_owner(&self, collection: &Collection) {
    match collection.user.as_ref().and_then(UserRef::id) {
      Some(owner) => {
        self.lists.invalidate_scope(&Scope::of(BY_USER, owner));
      }
      None => {
        self.lists.invalidate_kind(BY_USER);
      }
    }
  }

  fn invalidate_contents(&self, id: &ResourceId) {
    self.photos.invalidate_scope(&Scope::of(PHOTOS, id));
    self.drop_counters(id);
  }

  fn drop_counters(&self, id: &ResourceId) {
    self.by_id.remove(&CacheKey::record(RECORD, id));
    self.stats.remove(&CacheKey::record(STATS, id));
  }

  fn announce(&self, event: ManagerEvent, sync: SyncEvent, collection: &Collection) {
    let payload = serde_json::to_value(collection).unwrap_or(Value::Null);
    self.state.emit(event, payload.clone());
    self.sync.notify(sync, payload);
  }
}
