use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{Download, DownloadLimits, Page, Photo, ResourceId, Stats};
use crate::requests::downloads;

#[derive(Clone)]
pub struct DownloadsService {
  client: ApiClient,
}

impl DownloadsService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn track_download(&self, photo_id: &ResourceId) -> ApiResult<Download> {
    self
      .client
      .execute(downloads::track_download(photo_id))
      .await
      .context("Failed to track download")
  }

  pub async fn get_history(&self, user_id: &ResourceId) -> ApiResult<Page<Download>> {
    self
      .client
      .execute(downloads::history(user_id))
      .await
      .context("Failed to fetch download history")
  }

  pub async fn get_stats(&self, user_id: &ResourceId) -> ApiResult<Stats> {
    self
      .client
      .execute(downloads::stats(user_id))
      .await
      .context("Failed to fetch download stats")
  }

  pub async fn get_most_downloaded(&self) -> ApiResult<Page<Photo>> {
    self
      .client
      .execute(downloads::most_downloaded())
      .await
      .context("Failed to fetch most downloaded photos")
  }

  pub async fn check_limits(&self) -> ApiResult<DownloadLimits> {
    self
      .client
      .execute(downloads::check_limits())
      .await
      .context("Failed to check download limits")
  }

  pub async fn remove_by_photo(&self, photo_id: &ResourceId) -> ApiResult<()> {
    self
      .client
      .execute_unit(downloads::remove_by_photo(photo_id))
      .await
      .context("Failed to remove download")
  }
}
