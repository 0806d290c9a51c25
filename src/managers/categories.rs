use serde_json::{json, Value};

use super::base::{ManagerEvent, ManagerState};
use crate::cache::{CacheKey, CacheLayer, CacheStore, Scope};
use crate::error::ApiResult;
use crate::events::{SyncBus, SyncEvent};
use crate::models::{Category, Page, Photo, ResourceId, Stats};
use crate::params::PageRequest;
use crate::requests::categories::CategoryForm;
use crate::services::CategoriesService;

const RECORD: &str = "category";
const ALL: &str = "all_categories";
const POPULAR: &str = "popular_categories";
const PHOTOS: &str = "category_photos";
const STATS: &str = "category_stats";

pub struct CategoriesManager {
  service: CategoriesService,
  sync: SyncBus,
  layer: CacheLayer,
  state: ManagerState,
  by_id: CacheStore<Category>,
  lists: CacheStore<Page<Category>>,
  photos: CacheStore<Page<Photo>>,
  stats: CacheStore<Stats>,
}

impl CategoriesManager {
  pub fn new(service: CategoriesService, sync: SyncBus, layer: CacheLayer) -> Self {
    Self {
      service,
      sync,
      layer,
      state: ManagerState::new("categories"),
      by_id: CacheStore::new(),
      lists: CacheStore::new(),
      photos: CacheStore::new(),
      stats: CacheStore::new(),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  pub async fn get_all(&self) -> ApiResult<Page<Category>> {
    let data = self
      .state
      .cached(&self.layer, &self.lists, CacheKey::global(ALL), self.service.get_all())
      .await?;
    self.by_id.seed(RECORD, &data.results);
    Ok(data)
  }

  pub async fn get_category(&self, id: &ResourceId) -> ApiResult<Category> {
    self
      .state
      .cached(
        &self.layer,
        &self.by_id,
        CacheKey::record(RECORD, id),
        self.service.get_category(id),
      )
      .await
  }

  pub async fn create_category(&self, form: &CategoryForm) -> ApiResult<Category> {
    self
      .state
      .track(async {
        let category = self.service.create_category(form).await?;
        self.invalidate(&category.id);
        self
          .by_id
          .insert(CacheKey::record(RECORD, &category.id), category.clone());
        self.announce(ManagerEvent::Created, SyncEvent::CategoryCreated, &category);
        Ok(category)
      })
      .await
  }

  pub async fn update_category(&self, id: &ResourceId, form: &CategoryForm) -> ApiResult<Category> {
    self
      .state
      .track(async {
        let category = self.service.update_category(id, form).await?;
        self.invalidate(id);
        self.by_id.insert(CacheKey::record(RECORD, id), category.clone());
        self.announce(ManagerEvent::Updated, SyncEvent::CategoryUpdated, &category);
        Ok(category)
      })
      .await
  }

  pub async fn delete_category(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.delete_category(id).await?;
        self.invalidate(id);
        let payload = json!({ "id": id });
        self.state.emit(ManagerEvent::Deleted, payload.clone());
        self.sync.notify(SyncEvent::CategoryDeleted, payload);
        Ok(())
      })
      .await
  }

  pub async fn add_photos(&self, id: &ResourceId, photo_ids: &[ResourceId]) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.add_photos(id, photo_ids).await?;
        self.invalidate(id);
        self.sync.notify(SyncEvent::CategoryUpdated, json!({ "id": id }));
        Ok(())
      })
      .await
  }

  pub async fn remove_photos(&self, id: &ResourceId, photo_ids: &[ResourceId]) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.remove_photos(id, photo_ids).await?;
        self.invalidate(id);
        self.sync.notify(SyncEvent::CategoryUpdated, json!({ "id": id }));
        Ok(())
      })
      .await
  }

  pub async fn get_category_photos(&self, id: &ResourceId, page: PageRequest) -> ApiResult<Page<Photo>> {
    self
      .state
      .cached(
        &self.layer,
        &self.photos,
        CacheKey::page(PHOTOS, id, page),
        self.service.get_category_photos(id, page),
      )
      .await
  }

  pub async fn get_popular(&self) -> ApiResult<Page<Category>> {
    self
      .state
      .cached(&self.layer, &self.lists, CacheKey::global(POPULAR), self.service.get_popular())
      .await
  }

  pub async fn get_stats(&self, id: &ResourceId) -> ApiResult<Stats> {
    self
      .state
      .cached(&self.layer, &self.stats, CacheKey::record(STATS, id), self.service.get_stats(id))
      .await
  }

  pub fn reset(&self) {
    self.by_id.clear();
    self.lists.clear();
    self.photos.clear();
    self.stats.clear();
    self.state.reset();
  }

  fn invalidate(&self, id: &ResourceId) {
    self.by_id.remove(&CacheKey::record(RECORD, id));
    self.photos.invalidate_scope(&Scope::of(PHOTOS, id));
    self.stats.remove(&CacheKey::record(STATS, id));
    self.lists.remove(&CacheKey::global(ALL));
    self.lists.remove(&CacheKey::global(POPULAR));
  }

  fn announce(&self, event: ManagerEvent, sync: SyncEvent, category: &Category) {
    let payload = serde_json::to_value(category).unwrap_or(Value::Null);
    self.state.emit(event, payload.clone());
    self.sync.notify(sync, payload);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::session_for;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_adding_photos_refreshes_category_pages_and_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/categories/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 4, "name": "Nature"}])))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/categories/4/photos/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "results": []})))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/categories/4/add_photos/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "ok"})))
      .expect(1)
      .mount(&server)
      .await;

    let client = session_for(&server);
    let categories = CategoriesManager::new(
      CategoriesService::new(client.clone()),
      client.sync().clone(),
      CacheLayer::new(),
    );
    let id = ResourceId::Int(4);

    categories.get_all().await.unwrap();
    categories.get_category_photos(&id, PageRequest::default()).await.unwrap();
    // served from the cache
    categories.get_all().await.unwrap();

    categories.add_photos(&id, &[ResourceId::Int(9)]).await.unwrap();

    categories.get_all().await.unwrap();
    categories.get_category_photos(&id, PageRequest::default()).await.unwrap();
  }
}
