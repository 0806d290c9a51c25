use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{FollowStatus, Page, Stats, UserSummary};
use crate::requests::followers;

#[derive(Clone)]
pub struct FollowersService {
  client: ApiClient,
}

impl FollowersService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn toggle_follow(&self, username: &str) -> ApiResult<FollowStatus> {
    self
      .client
      .execute(followers::toggle_follow(username))
      .await
      .context("Failed to toggle follow")
  }

  pub async fn get_followers(&self, username: &str) -> ApiResult<Page<UserSummary>> {
    self
      .client
      .execute(followers::followers(username))
      .await
      .context("Failed to fetch followers")
  }

  pub async fn get_following(&self, username: &str) -> ApiResult<Page<UserSummary>> {
    self
      .client
      .execute(followers::following(username))
      .await
      .context("Failed to fetch following")
  }

  pub async fn get_stats(&self, username: &str) -> ApiResult<Stats> {
    self
      .client
      .execute(followers::stats(username))
      .await
      .context("Failed to fetch follower stats")
  }

  pub async fn check_follow(&self, username: &str) -> ApiResult<FollowStatus> {
    self
      .client
      .execute(followers::check_follow(username))
      .await
      .context("Failed to check follow status")
  }

  pub async fn get_suggested_users(&self) -> ApiResult<Page<UserSummary>> {
    self
      .client
      .execute(followers::suggested())
      .await
      .context("Failed to fetch suggested users")
  }
}
