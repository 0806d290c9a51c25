use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{Category, Page, Photo, ResourceId, Stats};
use crate::params::PageRequest;
use crate::requests::categories::{self, CategoryForm};

#[derive(Clone)]
pub struct CategoriesService {
  client: ApiClient,
}

impl CategoriesService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn get_all(&self) -> ApiResult<Page<Category>> {
    self
      .client
      .execute(categories::all())
      .await
      .context("Failed to fetch categories")
  }

  pub async fn get_category(&self, id: &ResourceId) -> ApiResult<Category> {
    self
      .client
      .execute(categories::get(id))
      .await
      .context("Failed to fetch category")
  }

  pub async fn create_category(&self, form: &CategoryForm) -> ApiResult<Category> {
    self
      .client
      .execute(categories::create(form)?)
      .await
      .context("Failed to create category")
  }

  pub async fn update_category(&self, id: &ResourceId, form: &CategoryForm) -> ApiResult<Category> {
    self
      .client
      .execute(categories::update(id, form)?)
      .await
      .context("Failed to update category")
  }

  pub async fn delete_category(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .client
      .execute_unit(categories::delete(id))
      .await
      .context("Failed to delete category")
  }

  pub async fn add_photos(&self, id: &ResourceId, photo_ids: &[ResourceId]) -> ApiResult<()> {
    self
      .client
      .execute_unit(categories::add_photos(id, photo_ids))
      .await
      .context("Failed to add photos to category")
  }

  pub async fn remove_photos(&self, id: &ResourceId, photo_ids: &[ResourceId]) -> ApiResult<()> {
    self
      .client
      .execute_unit(categories::remove_photos(id, photo_ids))
      .await
      .context("Failed to remove photos from category")
  }

  pub async fn get_category_photos(&self, id: &ResourceId, page: PageRequest) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(categories::category_photos(id, page))
      .await
      .context("Failed to fetch category photos")
  }

  pub async fn get_popular(&self) -> ApiResult<Page<Category>> {
    self
      .client
      .execute(categories::popular())
      .await
      .context("Failed to fetch popular categories")
  }

  pub async fn get_stats(&self, id: &ResourceId) -> ApiResult<Stats> {
    self
      .client
      .execute(categories::stats(id))
      .await
      .context("Failed to fetch category stats")
  }
}
