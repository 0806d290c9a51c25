use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{Comment, Page, ResourceId, Stats};
use crate::params::PageRequest;
use crate::requests::comments;

#[derive(Clone)]
pub struct CommentsService {
  client: ApiClient,
}

impl CommentsService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn add_comment(&self, photo_id: &ResourceId, text: &str) -> ApiResult<Comment> {
    self
      .client
      .execute(comments::create(photo_id, text))
      .await
      .context("Failed to add comment")
  }

  pub async fn get_comment(&self, id: &ResourceId) -> ApiResult<Comment> {
    self
      .client
      .execute(comments::get(id))
      .await
      .context("Failed to fetch comment")
  }

  pub async fn update_comment(&self, id: &ResourceId, text: &str) -> ApiResult<Comment> {
    self
      .client
      .execute(comments::update(id, text))
      .await
      .context("Failed to update comment")
  }

  pub async fn delete_comment(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .client
      .execute_unit(comments::delete(id))
      .await
      .context("Failed to delete comment")
  }

  pub async fn get_photo_comments(&self, photo_id: &ResourceId, page: PageRequest) -> ApiResult<Page<Comment>> {
    self
      .client
      .execute(comments::photo_comments(photo_id, page))
      .await
      .context("Failed to fetch photo comments")
  }

  pub async fn get_user_comments(&self, user_id: &ResourceId) -> ApiResult<Page<Comment>> {
    self
      .client
      .execute(comments::user_comments(user_id))
      .await
      .context("Failed to fetch user comments")
  }

  pub async fn get_stats(&self, photo_id: &ResourceId) -> ApiResult<Stats> {
    self
      .client
      .execute(comments::stats(photo_id))
      .await
      .context("Failed to fetch comment stats")
  }

  pub async fn get_recent(&self) -> ApiResult<Page<Comment>> {
    self
      .client
      .execute(comments::recent())
      .await
      .context("Failed to fetch recent comments")
  }

  pub async fn get_user_stats(&self, user_id: &ResourceId) -> ApiResult<Stats> {
    self
      .client
      .execute(comments::user_stats(user_id))
      .await
      .context("Failed to fetch user comment stats")
  }

  pub async fn report_comment(&self, id: &ResourceId, reason: &str) -> ApiResult<()> {
    self
      .client
      .execute_unit(comments::report(id, reason))
      .await
      .context("Failed to report comment")
  }

  pub async fn like_comment(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .client
      .execute_unit(comments::like(id))
      .await
      .context("Failed to like comment")
  }

  pub async fn unlike_comment(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .client
      .execute_unit(comments::unlike(id))
      .await
      .context("Failed to unlike comment")
  }
}
