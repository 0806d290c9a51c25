use serde_json::json;

use crate::http::ApiRequest;
use crate::models::ResourceId;

pub fn toggle_like(photo_id: &ResourceId) -> ApiRequest {
  ApiRequest::post("likes/toggle_like/").json(json!({ "photo_id": photo_id }))
}

pub fn photo_likes(photo_id: &ResourceId) -> ApiRequest {
  ApiRequest::get("likes/photo_likes/").query("photo_id", photo_id)
}

pub fn user_likes(username: &str) -> ApiRequest {
  ApiRequest::get("likes/user_likes/").query("username", username)
}

pub fn recent() -> ApiRequest {
  ApiRequest::get("likes/recent/")
}

pub fn stats(photo_id: &ResourceId) -> ApiRequest {
  ApiRequest::get("likes/stats/").query("photo_id", photo_id)
}

pub fn user_stats(username: &str) -> ApiRequest {
  ApiRequest::get("likes/user_stats/").query("username", username)
}

pub fn check_like(photo_id: &ResourceId) -> ApiRequest {
  ApiRequest::get("likes/check_like/").query("photo_id", photo_id)
}
