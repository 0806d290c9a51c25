use serde::Serialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::http::ApiRequest;
use crate::models::ResourceId;
use crate::params::PageRequest;
use super::segment;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryForm {
  pub name: String,
}

pub fn all() -> ApiRequest {
  ApiRequest::get("categories/")
}

pub fn get(id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("categories/{}/", segment(id)))
}

pub fn create(form: &CategoryForm) -> ApiResult<ApiRequest> {
  ApiRequest::post("categories/").json_from(form)
}

pub fn update(id: &ResourceId, form: &CategoryForm) -> ApiResult<ApiRequest> {
  ApiRequest::put(format!("categories/{}/", segment(id))).json_from(form)
}

pub fn delete(id: &ResourceId) -> ApiRequest {
  ApiRequest::delete(format!("categories/{}/", segment(id)))
}

pub fn add_photos(id: &ResourceId, photo_ids: &[ResourceId]) -> ApiRequest {
  ApiRequest::post(format!("categories/{}/add_photos/", segment(id))).json(json!({ "photo_ids": photo_ids }))
}

pub fn remove_photos(id: &ResourceId, photo_ids: &[ResourceId]) -> ApiRequest {
  ApiRequest::post(format!("categories/{}/remove_photos/", segment(id))).json(json!({ "photo_ids": photo_ids }))
}

pub fn category_photos(id: &ResourceId, page: PageRequest) -> ApiRequest {
  ApiRequest::get(format!("categories/{}/photos/", segment(id))).params(&page.to_params())
}

pub fn popular() -> ApiRequest {
  ApiRequest::get("categories/popular/")
}

pub fn stats(id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("categories/{}/stats/", segment(id)))
}
