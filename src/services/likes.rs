use serde_json::Value;

use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{LikeStatus, Page, Photo, ResourceId, Stats};
use crate::requests::likes;

#[derive(Clone)]
pub struct LikesService {
  client: ApiClient,
}

impl LikesService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn toggle_like(&self, photo_id: &ResourceId) -> ApiResult<LikeStatus> {
    self
      .client
      .execute(likes::toggle_like(photo_id))
      .await
      .context("Failed to toggle like")
  }

  /// Like records for a photo; their shape varies, so they stay raw.
  pub async fn get_photo_likes(&self, photo_id: &ResourceId) -> ApiResult<Page<Value>> {
    self
      .client
      .execute(likes::photo_likes(photo_id))
      .await
      .context("Failed to fetch photo likes")
  }

  pub async fn get_user_likes(&self, username: &str) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(likes::user_likes(username))
      .await
      .context("Failed to fetch liked photos")
  }

  pub async fn get_recent(&self) -> ApiResult<Page<Value>> {
    self
      .client
      .execute(likes::recent())
      .await
      .context("Failed to fetch recent likes")
  }

  pub async fn get_stats(&self, photo_id: &ResourceId) -> ApiResult<Stats> {
    self
      .client
      .execute(likes::stats(photo_id))
      .await
      .context("Failed to fetch like stats")
  }

  pub async fn get_user_stats(&self, username: &str) -> ApiResult<Stats> {
    self
      .client
      .execute(likes::user_stats(username))
      .await
      .context("Failed to fetch user like stats")
  }

  pub async fn check_like(&self, photo_id: &ResourceId) -> ApiResult<LikeStatus> {
    self
      .client
      .execute(likes::check_like(photo_id))
      .await
      .context("Failed to check like status")
  }
}
