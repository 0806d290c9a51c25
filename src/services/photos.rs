use serde_json::Value;

use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{Page, Photo, ResourceId, Stats};
use crate::params::{PageRequest, QueryParams};
use crate::requests::photos::{self, PhotoQuery, PhotoUpdate, PhotoUpload};

#[derive(Clone)]
pub struct PhotosService {
  client: ApiClient,
}

impl PhotosService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list_photos(&self, query: &PhotoQuery) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(photos::list(query))
      .await
      .context("Failed to fetch photos")
  }

  pub async fn get_photo(&self, id: &ResourceId) -> ApiResult<Photo> {
    self
      .client
      .execute(photos::get(id))
      .await
      .context("Failed to fetch photo")
  }

  pub async fn upload_photo(&self, upload: &PhotoUpload) -> ApiResult<Photo> {
    self
      .client
      .execute(photos::upload(upload))
      .await
      .context("Failed to upload photo")
  }

  pub async fn update_photo(&self, id: &ResourceId, update: &PhotoUpdate) -> ApiResult<Photo> {
    self
      .client
      .execute(photos::update(id, update)?)
      .await
      .context("Failed to update photo")
  }

  pub async fn delete_photo(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .client
      .execute_unit(photos::delete(id))
      .await
      .context("Failed to delete photo")
  }

  pub async fn get_user_photos(&self, username: &str, params: &QueryParams) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(photos::user_photos(username, params))
      .await
      .context("Failed to fetch user photos")
  }

  pub async fn get_user_gallery(
    &self,
    user_id: &ResourceId,
    page: PageRequest,
    ordering: &str,
  ) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(photos::user_gallery(user_id, page, ordering))
      .await
      .context("Failed to fetch user gallery")
  }

  pub async fn get_feed(&self, params: &QueryParams) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(photos::feed(params))
      .await
      .context("Failed to fetch feed")
  }

  pub async fn get_trending(&self, params: &QueryParams) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(photos::trending(params))
      .await
      .context("Failed to fetch trending photos")
  }

  pub async fn get_featured(&self, params: &QueryParams) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(photos::featured(params))
      .await
      .context("Failed to fetch featured photos")
  }

  pub async fn search_photos(
    &self,
    query: &str,
    page: PageRequest,
    ordering: Option<&str>,
  ) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(photos::search(query, page, ordering))
      .await
      .context("Failed to search photos")
  }

  pub async fn get_stats(&self, id: &ResourceId) -> ApiResult<Stats> {
    self
      .client
      .execute(photos::stats(id))
      .await
      .context("Failed to fetch photo stats")
  }

  pub async fn report_photo(&self, id: &ResourceId, reason: &str) -> ApiResult<()> {
    self
      .client
      .execute_unit(photos::report(id, reason))
      .await
      .context("Failed to report photo")
  }

  /// Returns whatever the server answers; usually the download URL.
  pub async fn download_photo(&self, id: &ResourceId) -> ApiResult<Value> {
    self
      .client
      .execute(photos::download(id))
      .await
      .context("Failed to download photo")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use crate::test_support::session_for;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_error_gets_context_and_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/photos/9/"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
      .mount(&server)
      .await;

    let service = PhotosService::new(session_for(&server));
    let err = service.get_photo(&ResourceId::Int(9)).await.unwrap_err();

    assert_eq!(err.message, "Failed to fetch photo: Not found.");
    assert_eq!(err.status, Some(404));
    assert_eq!(err.kind, ErrorKind::Client);
  }

  #[tokio::test]
  async fn test_bare_array_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/photos/feed/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        {"id": 1, "title": "Dunes"},
        {"id": 2, "title": "Harbor"}
      ])))
      .mount(&server)
      .await;

    let service = PhotosService::new(session_for(&server));
    let page = service.get_feed(&QueryParams::new()).await.unwrap();

    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[1].title, "Harbor");
  }
}
