use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{Collection, FollowStatus, LikeStatus, Page, Photo, ResourceId, Stats};
use crate::params::PageRequest;
use crate::requests::collections::{self, CollectionForm};

#[derive(Clone)]
pub struct CollectionsService {
  client: ApiClient,
}

impl CollectionsService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn get_user_collections(
    &self,
    user_id: &ResourceId,
    page: PageRequest,
  ) -> ApiResult<Page<Collection>> {
    self
      .client
      .execute(collections::user_collections(user_id, page))
      .await
      .context("Failed to fetch user collections")
  }

  pub async fn get_collection(&self, id: &ResourceId) -> ApiResult<Collection> {
    self
      .client
      .execute(collections::get(id))
      .await
      .context("Failed to fetch collection")
  }

  pub async fn create_collection(&self, form: &CollectionForm) -> ApiResult<Collection> {
    self
      .client
      .execute(collections::create(form)?)
      .await
      .context("Failed to create collection")
  }

  pub async fn update_collection(&self, id: &ResourceId, form: &CollectionForm) -> ApiResult<Collection> {
    self
      .client
      .execute(collections::update(id, form)?)
      .await
      .context("Failed to update collection")
  }

  pub async fn delete_collection(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .client
      .execute_unit(collections::delete(id))
      .await
      .context("Failed to delete collection")
  }

  pub async fn add_photos(&self, id: &ResourceId, photo_ids: &[ResourceId]) -> ApiResult<()> {
    self
      .client
      .execute_unit(collections::add_photos(id, photo_ids))
      .await
      .context("Failed to add photos to collection")
  }

  pub async fn remove_photos(&self, id: &ResourceId, photo_ids: &[ResourceId]) -> ApiResult<()> {
    self
      .client
      .execute_unit(collections::remove_photos(id, photo_ids))
      .await
      .context("Failed to remove photos from collection")
  }

  pub async fn toggle_like(&self, id: &ResourceId) -> ApiResult<LikeStatus> {
    self
      .client
      .execute(collections::toggle_like(id))
      .await
      .context("Failed to toggle collection like")
  }

  pub async fn toggle_follow(&self, id: &ResourceId) -> ApiResult<FollowStatus> {
    self
      .client
      .execute(collections::toggle_follow(id))
      .await
      .context("Failed to toggle collection follow")
  }

  pub async fn get_featured(&self) -> ApiResult<Page<Collection>> {
    self
      .client
      .execute(collections::featured())
      .await
      .context("Failed to fetch featured collections")
  }

  pub async fn get_trending(&self, days: u32) -> ApiResult<Page<Collection>> {
    self
      .client
      .execute(collections::trending(days))
      .await
      .context("Failed to fetch trending collections")
  }

  pub async fn get_stats(&self, id: &ResourceId) -> ApiResult<Stats> {
    self
      .client
      .execute(collections::stats(id))
      .await
      .context("Failed to fetch collection stats")
  }

  pub async fn get_collection_photos(&self, id: &ResourceId, page: PageRequest) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(collections::collection_photos(id, page))
      .await
      .context("Failed to fetch collection photos")
  }
}
