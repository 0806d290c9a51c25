use serde_json::json;

use crate::http::ApiRequest;

pub fn toggle_follow(username: &str) -> ApiRequest {
  ApiRequest::post("followers/toggle_follow/").json(json!({ "username": username }))
}

pub fn followers(username: &str) -> ApiRequest {
  ApiRequest::get("followers/followers/").query("username", username)
}

pub fn following(username: &str) -> ApiRequest {
  ApiRequest::get("followers/following/").query("username", username)
}

pub fn stats(username: &str) -> ApiRequest {
  ApiRequest::get("followers/stats/").query("username", username)
}

pub fn check_follow(username: &str) -> ApiRequest {
  ApiRequest::get("followers/check_follow/").query("username", username)
}

pub fn suggested() -> ApiRequest {
  ApiRequest::get("followers/suggest_users/")
}
