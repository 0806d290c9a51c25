use serde::Serialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::http::{ApiRequest, UploadForm};
use crate::models::ResourceId;
use crate::params::{PageRequest, QueryParams};
use super::segment;

pub const DEFAULT_GALLERY_ORDERING: &str = "-upload_date";

/// Filters for the photo listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoQuery {
  pub page: PageRequest,
  pub time_period: Option<String>,
  pub username: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  pub min_likes: Option<u64>,
  pub max_likes: Option<u64>,
  pub search: Option<String>,
  pub ordering: Option<String>,
}

impl PhotoQuery {
  /// Normalized parameters as the listing endpoint names them.
  pub fn to_params(&self) -> QueryParams {
    self
      .page
      .to_params()
      .with_opt("time_period", self.time_period.as_ref())
      .with_opt("user__username", self.username.as_ref())
      .with_opt("upload_date__gte", self.start_date.as_ref())
      .with_opt("upload_date__lte", self.end_date.as_ref())
      .with_opt("likes_count__gte", self.min_likes)
      .with_opt("likes_count__lte", self.max_likes)
      .with_opt("search", self.search.as_ref())
      .with_opt("ordering", self.ordering.as_ref())
      .with("include_user_photos", true)
  }
}

/// A new photo: the image file plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
  pub title: String,
  pub description: Option<String>,
  pub file_name: String,
  pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhotoUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

pub fn list(query: &PhotoQuery) -> ApiRequest {
  ApiRequest::get("photos/").params(&query.to_params())
}

pub fn get(id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("photos/{}/", segment(id)))
}

pub fn upload(upload: &PhotoUpload) -> ApiRequest {
  let form = UploadForm::new()
    .text("title", &upload.title)
    .text_opt("description", upload.description.as_ref())
    .file("image", &upload.file_name, upload.bytes.clone());
  ApiRequest::post("photos/upload/").multipart(form)
}

pub fn update(id: &ResourceId, update: &PhotoUpdate) -> ApiResult<ApiRequest> {
  ApiRequest::patch(format!("photos/{}/", segment(id))).json_from(update)
}

pub fn delete(id: &ResourceId) -> ApiRequest {
  ApiRequest::delete(format!("photos/{}/", segment(id)))
}

pub fn user_photos(username: &str, params: &QueryParams) -> ApiRequest {
  ApiRequest::get(format!("photos/user/{}/", segment(username))).params(params)
}

pub fn user_gallery(user_id: &ResourceId, page: PageRequest, ordering: &str) -> ApiRequest {
  ApiRequest::get("photos/user_gallery/")
    .query("user_id", user_id)
    .params(&page.to_params())
    .query("ordering", ordering)
}

pub fn feed(params: &QueryParams) -> ApiRequest {
  ApiRequest::get("photos/feed/").params(params)
}

pub fn trending(params: &QueryParams) -> ApiRequest {
  ApiRequest::get("photos/trending/").params(params)
}

pub fn featured(params: &QueryParams) -> ApiRequest {
  ApiRequest::get("photos/featured/").params(params)
}

pub fn search(query: &str, page: PageRequest, ordering: Option<&str>) -> ApiRequest {
  let params = page
    .to_params()
    .with("search", query)
    .with_opt("ordering", ordering);
  ApiRequest::get("photos/").params(&params)
}

pub fn stats(id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("photos/{}/stats/", segment(id)))
}

pub fn report(id: &ResourceId, reason: &str) -> ApiRequest {
  ApiRequest::post(format!("photos/{}/report/", segment(id))).json(json!({ "reason": reason }))
}

pub fn download(id: &ResourceId) -> ApiRequest {
  ApiRequest::post(format!("photos/{}/download/", segment(id))).json(json!({}))
}
