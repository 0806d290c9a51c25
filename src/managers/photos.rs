use serde_json::{json, Value};

use super::base::{ManagerEvent, ManagerState};
use crate::cache::{CacheKey, CacheLayer, CacheStore, Scope};
use crate::error::ApiResult;
use crate::events::{SyncBus, SyncEvent};
use crate::models::{Page, Photo, ResourceId, Stats, UserRef};
use crate::params::{PageRequest, QueryParams};
use crate::requests::photos::{PhotoQuery, PhotoUpdate, PhotoUpload};
use crate::services::PhotosService;

const LIST: &str = "photos";
const USER_PHOTOS: &str = "user_photos";
const USER_GALLERY: &str = "user_gallery";
const FEED: &str = "feed";
const TRENDING: &str = "trending";
const FEATURED: &str = "featured";
const SEARCH: &str = "search";

/// Listings that may include any photo and are dropped after every
/// mutation.
const SHARED_LISTS: [&str; 5] = [LIST, FEED, TRENDING, FEATURED, SEARCH];

pub struct PhotosManager {
  service: PhotosService,
  sync: SyncBus,
  layer: CacheLayer,
  state: ManagerState,
  photos: CacheStore<Photo>,
  lists: CacheStore<Page<Photo>>,
  stats: CacheStore<Stats>,
}

impl PhotosManager {
  pub fn new(service: PhotosService, sync: SyncBus, layer: CacheLayer) -> Self {
    Self {
      service,
      sync,
      layer,
      state: ManagerState::new("photos"),
      photos: CacheStore::new(),
      lists: CacheStore::new(),
      stats: CacheStore::new(),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  pub async fn list_photos(&self, query: &PhotoQuery) -> ApiResult<Page<Photo>> {
    let key = CacheKey::new(Scope::global(LIST), query.to_params());
    let page = self
      .state
      .cached(&self.layer, &self.lists, key, self.service.list_photos(query))
      .await?;
    self.sync.notify(SyncEvent::PhotosLoaded, json!({ "count": page.results.len() }));
    Ok(page)
  }

  pub async fn get_photo(&self, id: &ResourceId) -> ApiResult<Photo> {
    self
      .state
      .cached(&self.layer, &self.photos, CacheKey::record("photo", id), self.service.get_photo(id))
      .await
  }

  pub async fn upload_photo(&self, upload: &PhotoUpload) -> ApiResult<Photo> {
    self
      .state
      .track(async {
        let photo = self.service.upload_photo(upload).await?;
        self.invalidate_photo(&photo.id, photo.user.as_ref());
        self.photos.insert(CacheKey::record("photo", &photo.id), photo.clone());
        self.announce(ManagerEvent::Created, SyncEvent::PhotoCreated, &photo);
        Ok(photo)
      })
      .await
  }

  pub async fn update_photo(&self, id: &ResourceId, update: &PhotoUpdate) -> ApiResult<Photo> {
    self
      .state
      .track(async {
        let photo = self.service.update_photo(id, update).await?;
        self.invalidate_photo(id, photo.user.as_ref());
        self.photos.insert(CacheKey::record("photo", id), photo.clone());
        self.announce(ManagerEvent::Updated, SyncEvent::PhotoUpdated, &photo);
        Ok(photo)
      })
      .await
  }

  pub async fn delete_photo(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .state
      .track(async {
        let owner = self
          .photos
          .get_value(&CacheKey::record("photo", id))
          .and_then(|photo| photo.user);
        self.service.delete_photo(id).await?;
        self.invalidate_photo(id, owner.as_ref());
        let payload = json!({ "id": id });
        self.state.emit(ManagerEvent::Deleted, payload.clone());
        self.sync.notify(SyncEvent::PhotoDeleted, payload);
        Ok(())
      })
      .await
  }

  pub async fn get_user_photos(&self, username: &str, params: &QueryParams) -> ApiResult<Page<Photo>> {
    let key = CacheKey::new(Scope::of(USER_PHOTOS, username), params.clone());
    self
      .state
      .cached(&self.layer, &self.lists, key, self.service.get_user_photos(username, params))
      .await
  }

  pub async fn get_user_gallery(
    &self,
    user_id: &ResourceId,
    page: PageRequest,
    ordering: &str,
  ) -> ApiResult<Page<Photo>> {
    let key = CacheKey::new(
      Scope::of(USER_GALLERY, user_id),
      page.to_params().with("ordering", ordering),
    );
    self
      .state
      .cached(
        &self.layer,
        &self.lists,
        key,
        self.service.get_user_gallery(user_id, page, ordering),
      )
      .await
  }

  pub async fn get_feed(&self, params: &QueryParams) -> ApiResult<Page<Photo>> {
    let key = CacheKey::new(Scope::global(FEED), params.clone());
    self
      .state
      .cached(&self.layer, &self.lists, key, self.service.get_feed(params))
      .await
  }

  pub async fn get_trending(&self, params: &QueryParams) -> ApiResult<Page<Photo>> {
    let key = CacheKey::new(Scope::global(TRENDING), params.clone());
    self
      .state
      .cached(&self.layer, &self.lists, key, self.service.get_trending(params))
      .await
  }

  pub async fn get_featured(&self, params: &QueryParams) -> ApiResult<Page<Photo>> {
    let key = CacheKey::new(Scope::global(FEATURED), params.clone());
    self
      .state
      .cached(&self.layer, &self.lists, key, self.service.get_featured(params))
      .await
  }

  pub async fn search_photos(
    &self,
    query: &str,
    page: PageRequest,
    ordering: Option<&str>,
  ) -> ApiResult<Page<Photo>> {
    let params = page
      .to_params()
      .with("search", query)
      .with_opt("ordering", ordering);
    let key = CacheKey::new(Scope::global(SEARCH), params);
    self
      .state
      .cached(
        &self.layer,
        &self.lists,
        key,
        self.service.search_photos(query, page, ordering),
      )
      .await
  }

  pub async fn get_stats(&self, id: &ResourceId) -> ApiResult<Stats> {
    self
      .state
      .cached(&self.layer, &self.stats, CacheKey::record("photo_stats", id), self.service.get_stats(id))
      .await
  }

  pub async fn report_photo(&self, id: &ResourceId, reason: &str) -> ApiResult<()> {
    self.state.track(self.service.report_photo(id, reason)).await
  }

  pub async fn download_photo(&self, id: &ResourceId) -> ApiResult<Value> {
    self
      .state
      .track(async {
        self.sync.notify(SyncEvent::DownloadStarted, json!({ "photo_id": id }));
        match self.service.download_photo(id).await {
          Ok(data) => {
            self.stats.remove(&CacheKey::record("photo_stats", id));
            self.sync.notify(SyncEvent::PhotoDownloaded, json!({ "photo_id": id }));
            self.sync.notify(SyncEvent::DownloadCompleted, json!({ "photo_id": id }));
            Ok(data)
          }
          Err(err) => {
            self.sync.notify(
              SyncEvent::DownloadFailed,
              json!({ "photo_id": id, "message": err.message }),
            );
            Err(err)
          }
        }
      })
      .await
  }

  /// Drop everything a change to photo `id` may have made stale.
  fn invalidate_photo(&self, id: &ResourceId, owner: Option<&UserRef>) {
    self.photos.remove(&CacheKey::record("photo", id));
    self.stats.remove(&CacheKey::record("photo_stats", id));

    // listings are keyed by username and gallery by id; drop the whole
    // kind when the owner reference lacks the matching field
    match owner.and_then(UserRef::username) {
      Some(username) => self.lists.invalidate_scope(&Scope::of(USER_PHOTOS, username)),
      None => self.lists.invalidate_kind(USER_PHOTOS),
    };
    match owner.and_then(UserRef::id) {
      Some(owner_id) => self.lists.invalidate_scope(&Scope::of(USER_GALLERY, owner_id)),
      None => self.lists.invalidate_kind(USER_GALLERY),
    };

    for kind in SHARED_LISTS {
      self.lists.invalidate_kind(kind);
    }
  }

  fn announce(&self, event: ManagerEvent, sync: SyncEvent, photo: &Photo) {
    let payload = serde_json::to_value(photo).unwrap_or(Value::Null);
    self.state.emit(event, payload.clone());
    self.sync.notify(sync, payload);
  }

  /// Drop every cached photo and the last error.
  pub fn reset(&self) {
    self.photos.clear();
    self.lists.clear();
    self.stats.clear();
    self.state.reset();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::session_for;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn manager(server: &MockServer) -> PhotosManager {
    let client = session_for(server);
    PhotosManager::new(PhotosService::new(client.clone()), client.sync().clone(), CacheLayer::new())
  }

  fn photo(id: u64, title: &str) -> Value {
    json!({"id": id, "title": title, "user": {"id": 7, "username": "ana"}, "likes_count": 0})
  }

  #[tokio::test]
  async fn test_get_photo_hits_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/photos/42/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(photo(42, "Dunes")))
      .expect(1)
      .mount(&server)
      .await;

    let photos = manager(&server);
    let first = photos.get_photo(&ResourceId::Int(42)).await.unwrap();
    let second = photos.get_photo(&ResourceId::Int(42)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.title, "Dunes");
    assert!(!photos.state().is_loading());
  }

  #[tokio::test]
  async fn test_update_replaces_cached_photo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/photos/42/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(photo(42, "Dunes")))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("PATCH"))
      .and(path("/api/photos/42/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(photo(42, "Dunes at dusk")))
      .expect(1)
      .mount(&server)
      .await;

    let photos = manager(&server);
    photos.get_photo(&ResourceId::Int(42)).await.unwrap();
    photos
      .update_photo(
        &ResourceId::Int(42),
        &PhotoUpdate {
          title: Some("Dunes at dusk".into()),
          ..Default::default()
        },
      )
      .await
      .unwrap();

    let cached = photos.get_photo(&ResourceId::Int(42)).await.unwrap();
    assert_eq!(cached.title, "Dunes at dusk");
  }

  #[tokio::test]
  async fn test_delete_drops_owner_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/photos/42/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(photo(42, "Dunes")))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/photos/user/ana/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([photo(42, "Dunes")])))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/photos/user_gallery/"))
      .and(query_param("user_id", "7"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 1, "results": [photo(42, "Dunes")]})))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/api/photos/42/"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    let photos = manager(&server);
    let id = ResourceId::Int(42);
    let gallery_page = PageRequest::default();
    photos.get_photo(&id).await.unwrap();
    photos.get_user_photos("ana", &QueryParams::new()).await.unwrap();
    photos
      .get_user_gallery(&ResourceId::Int(7), gallery_page, "-upload_date")
      .await
      .unwrap();

    photos.delete_photo(&id).await.unwrap();

    photos.get_user_photos("ana", &QueryParams::new()).await.unwrap();
    photos
      .get_user_gallery(&ResourceId::Int(7), gallery_page, "-upload_date")
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn test_delete_with_bare_owner_id_drops_username_listings() {
    let server = MockServer::start().await;
    let bare = json!({"id": 42, "title": "Dunes", "user": 7});
    Mock::given(method("GET"))
      .and(path("/api/photos/42/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(bare.clone()))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/photos/user/ana/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([bare])))
      .up_to_n_times(1)
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/photos/user/ana/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/api/photos/42/"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    let photos = manager(&server);
    let id = ResourceId::Int(42);
    photos.get_photo(&id).await.unwrap();
    let before = photos.get_user_photos("ana", &QueryParams::new()).await.unwrap();
    assert_eq!(before.results.len(), 1);

    photos.delete_photo(&id).await.unwrap();

    let after = photos.get_user_photos("ana", &QueryParams::new()).await.unwrap();
    assert!(after.results.is_empty());
  }

  #[tokio::test]
  async fn test_failed_download_reports_and_records_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/photos/3/download/"))
      .respond_with(ResponseTemplate::new(429).set_body_json(json!({"detail": "Download limit reached"})))
      .mount(&server)
      .await;

    let photos = manager(&server);
    let err = photos.download_photo(&ResourceId::Int(3)).await.unwrap_err();

    assert_eq!(err.status, Some(429));
    assert_eq!(
      photos.state().last_error().map(|e| e.message),
      Some("Failed to download photo: Download limit reached".to_string())
    );
  }
}
