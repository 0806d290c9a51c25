use serde_json::json;

use crate::http::ApiRequest;
use crate::models::ResourceId;

pub fn track_download(photo_id: &ResourceId) -> ApiRequest {
  ApiRequest::post("downloads/track_download/").json(json!({ "photo_id": photo_id }))
}

pub fn history(user_id: &ResourceId) -> ApiRequest {
  ApiRequest::get("downloads/history/").query("user_id", user_id)
}

pub fn stats(user_id: &ResourceId) -> ApiRequest {
  ApiRequest::get("downloads/stats/").query("user_id", user_id)
}

pub fn most_downloaded() -> ApiRequest {
  ApiRequest::get("downloads/most_downloaded/")
}

pub fn check_limits() -> ApiRequest {
  ApiRequest::get("downloads/check_limits/")
}

/// The photo id travels in the body of the DELETE.
pub fn remove_by_photo(photo_id: &ResourceId) -> ApiRequest {
  ApiRequest::delete("downloads/remove_by_photo/").json(json!({ "photo_id": photo_id }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Body;
  use reqwest::Method;

  #[test]
  fn test_remove_by_photo_sends_body() {
    let req = remove_by_photo(&ResourceId::Int(5));
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.body, Body::Json(json!({"photo_id": 5})));
  }
}
