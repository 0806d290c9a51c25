use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{Notification, Page, ResourceId, Stats, UserProfile, UserSummary};
use crate::params::QueryParams;
use crate::requests::users::{self, PasswordChange, ProfileUpdate};

#[derive(Clone)]
pub struct UsersService {
  client: ApiClient,
}

impl UsersService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn get_user_profile(&self, username: &str) -> ApiResult<UserProfile> {
    self
      .client
      .execute(users::profile(username))
      .await
      .context("Failed to fetch user profile")
  }

  pub async fn get_user_by_id(&self, id: &ResourceId) -> ApiResult<UserProfile> {
    self
      .client
      .execute(users::by_id(id))
      .await
      .context("Failed to fetch user")
  }

  pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
    self
      .client
      .execute(users::update_profile(update))
      .await
      .context("Failed to update profile")
  }

  pub async fn change_password(&self, change: &PasswordChange) -> ApiResult<()> {
    self
      .client
      .execute_unit(users::change_password(change)?)
      .await
      .context("Failed to change password")
  }

  pub async fn get_user_stats(&self, username: &str) -> ApiResult<Stats> {
    self
      .client
      .execute(users::stats(username))
      .await
      .context("Failed to fetch user stats")
  }

  pub async fn get_followers(&self, username: &str, params: &QueryParams) -> ApiResult<Page<UserSummary>> {
    self
      .client
      .execute(users::followers(username, params))
      .await
      .context("Failed to fetch followers")
  }

  pub async fn get_following(&self, username: &str, params: &QueryParams) -> ApiResult<Page<UserSummary>> {
    self
      .client
      .execute(users::following(username, params))
      .await
      .context("Failed to fetch following")
  }

  pub async fn get_suggested_users(&self, params: &QueryParams) -> ApiResult<Page<UserSummary>> {
    self
      .client
      .execute(users::suggested(params))
      .await
      .context("Failed to fetch suggested users")
  }

  pub async fn search_users(&self, query: &str, params: &QueryParams) -> ApiResult<Page<UserSummary>> {
    self
      .client
      .execute(users::search(query, params))
      .await
      .context("Failed to search users")
  }

  pub async fn get_notifications(&self, params: &QueryParams) -> ApiResult<Page<Notification>> {
    self
      .client
      .execute(users::notifications(params))
      .await
      .context("Failed to fetch notifications")
  }

  pub async fn mark_notifications_read(&self, ids: &[ResourceId]) -> ApiResult<()> {
    self
      .client
      .execute_unit(users::mark_notifications_read(ids))
      .await
      .context("Failed to mark notifications as read")
  }

  pub async fn delete_account(&self) -> ApiResult<()> {
    self
      .client
      .execute_unit(users::delete_account())
      .await
      .context("Failed to delete account")
  }
}
