use serde_json::json;

use crate::http::ApiRequest;
use crate::models::ResourceId;
use crate::params::PageRequest;
use super::segment;

/// Comment threads are paged 20 at a time.
pub const COMMENTS_PAGE_SIZE: u32 = 20;

pub fn create(photo_id: &ResourceId, text: &str) -> ApiRequest {
  ApiRequest::post("comments/").json(json!({ "photo_id": photo_id, "comment_text": text }))
}

pub fn get(id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("comments/{}/", segment(id)))
}

pub fn update(id: &ResourceId, text: &str) -> ApiRequest {
  ApiRequest::patch(format!("comments/{}/", segment(id))).json(json!({ "comment_text": text }))
}

pub fn delete(id: &ResourceId) -> ApiRequest {
  ApiRequest::delete(format!("comments/{}/", segment(id)))
}

pub fn photo_comments(photo_id: &ResourceId, page: PageRequest) -> ApiRequest {
  ApiRequest::get(format!("comments/photo/{}/", segment(photo_id))).params(&page.to_params())
}

pub fn user_comments(user_id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("comments/user/{}/", segment(user_id)))
}

pub fn stats(photo_id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("comments/stats/{}/", segment(photo_id)))
}

pub fn recent() -> ApiRequest {
  ApiRequest::get("comments/recent/")
}

pub fn user_stats(user_id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("comments/user/{}/stats/", segment(user_id)))
}

pub fn report(id: &ResourceId, reason: &str) -> ApiRequest {
  ApiRequest::post(format!("comments/{}/report/", segment(id))).json(json!({ "reason": reason }))
}

pub fn like(id: &ResourceId) -> ApiRequest {
  ApiRequest::post(format!("comments/{}/like/", segment(id))).json(json!({}))
}

pub fn unlike(id: &ResourceId) -> ApiRequest {
  ApiRequest::post(format!("comments/{}/unlike/", segment(id))).json(json!({}))
}
