use serde::Serialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::http::ApiRequest;
use crate::models::ResourceId;
use crate::params::{PageRequest, QueryParams};
use super::segment;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionForm {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_public: Option<bool>,
}

const BASE: &str = "collections/collections";

pub fn user_collections(user_id: &ResourceId, page: PageRequest) -> ApiRequest {
  ApiRequest::get(format!("{}/user_collections/", BASE))
    .query("user_id", user_id)
    .params(&page.to_params())
}

pub fn get(id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("{}/{}/", BASE, segment(id)))
}

pub fn create(form: &CollectionForm) -> ApiResult<ApiRequest> {
  ApiRequest::post(format!("{}/", BASE)).json_from(form)
}

pub fn update(id: &ResourceId, form: &CollectionForm) -> ApiResult<ApiRequest> {
  ApiRequest::put(format!("{}/{}/", BASE, segment(id))).json_from(form)
}

pub fn delete(id: &ResourceId) -> ApiRequest {
  ApiRequest::delete(format!("{}/{}/", BASE, segment(id)))
}

pub fn add_photos(id: &ResourceId, photo_ids: &[ResourceId]) -> ApiRequest {
  ApiRequest::post(format!("{}/{}/add_photos/", BASE, segment(id))).json(json!({ "photo_ids": photo_ids }))
}

pub fn remove_photos(id: &ResourceId, photo_ids: &[ResourceId]) -> ApiRequest {
  ApiRequest::post(format!("{}/{}/remove_photos/", BASE, segment(id))).json(json!({ "photo_ids": photo_ids }))
}

pub fn toggle_like(id: &ResourceId) -> ApiRequest {
  ApiRequest::post(format!("{}/{}/toggle_like/", BASE, segment(id)))
}

pub fn toggle_follow(id: &ResourceId) -> ApiRequest {
  ApiRequest::post(format!("{}/{}/toggle_follow/", BASE, segment(id)))
}

pub fn featured() -> ApiRequest {
  ApiRequest::get(format!("{}/featured/", BASE))
}

pub fn trending(days: u32) -> ApiRequest {
  ApiRequest::get(format!("{}/trending/", BASE)).query("days", days)
}

pub fn stats(id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("{}/{}/stats/", BASE, segment(id)))
}

pub fn collection_photos(id: &ResourceId, page: PageRequest) -> ApiRequest {
  let params = QueryParams::new().with("collection", id).merge(&page.to_params());
  ApiRequest::get("collections/photo-collections/").params(&params)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Body;

  #[test]
  fn test_user_collections_request() {
    let req = user_collections(&ResourceId::Int(7), PageRequest::new(2, 10));
    assert_eq!(req.path, "collections/collections/user_collections/");
    assert_eq!(req.query.to_string(), "page=2&page_size=10&user_id=7");
  }

  #[test]
  fn test_add_photos_body() {
    let req = add_photos(&ResourceId::Int(3), &[ResourceId::Int(10), ResourceId::Int(11)]);
    assert_eq!(req.body, Body::Json(json!({"photo_ids": [10, 11]})));
  }
}
