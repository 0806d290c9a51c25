use serde::Serialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::http::{ApiRequest, UploadForm};
use crate::models::ResourceId;
use crate::params::QueryParams;
use super::segment;

/// A new avatar image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePicture {
  pub file_name: String,
  pub bytes: Vec<u8>,
}

/// Partial profile update. Unset fields are left unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
  pub full_name: Option<String>,
  pub username: Option<String>,
  pub email: Option<String>,
  pub bio: Option<String>,
  pub about: Option<String>,
  pub contact: Option<String>,
  pub profile_picture: Option<ProfilePicture>,
}

impl ProfileUpdate {
  fn to_form(&self) -> UploadForm {
    let form = UploadForm::new()
      .text_opt("full_name", self.full_name.as_ref())
      .text_opt("username", self.username.as_ref())
      .text_opt("email", self.email.as_ref())
      .text_opt("bio", self.bio.as_ref())
      .text_opt("about", self.about.as_ref())
      .text_opt("contact", self.contact.as_ref());

    match &self.profile_picture {
      Some(picture) => form.file("profile_picture", &picture.file_name, picture.bytes.clone()),
      None => form,
    }
  }
}

#[derive(Clone, Serialize)]
pub struct PasswordChange {
  pub old_password: String,
  pub new_password: String,
}

pub fn profile(username: &str) -> ApiRequest {
  ApiRequest::get(format!("users/{}/", segment(username)))
}

pub fn by_id(id: &ResourceId) -> ApiRequest {
  ApiRequest::get(format!("users/profile/{}/", segment(id)))
}

pub fn update_profile(update: &ProfileUpdate) -> ApiRequest {
  ApiRequest::patch("users/profile/").multipart(update.to_form())
}

pub fn change_password(change: &PasswordChange) -> ApiResult<ApiRequest> {
  ApiRequest::post("users/change-password/").json_from(change)
}

pub fn stats(username: &str) -> ApiRequest {
  ApiRequest::get(format!("users/{}/stats/", segment(username)))
}

pub fn followers(username: &str, params: &QueryParams) -> ApiRequest {
  ApiRequest::get(format!("users/{}/followers/", segment(username))).params(params)
}

pub fn following(username: &str, params: &QueryParams) -> ApiRequest {
  ApiRequest::get(format!("users/{}/following/", segment(username))).params(params)
}

pub fn suggested(params: &QueryParams) -> ApiRequest {
  ApiRequest::get("users/suggested/").params(params)
}

pub fn search(query: &str, params: &QueryParams) -> ApiRequest {
  ApiRequest::get("users/search/")
    .query("query", query)
    .params(params)
}

pub fn notifications(params: &QueryParams) -> ApiRequest {
  ApiRequest::get("users/notifications/").params(params)
}

pub fn mark_notifications_read(ids: &[ResourceId]) -> ApiRequest {
  ApiRequest::post("users/notifications/read/").json(json!({ "notification_ids": ids }))
}

pub fn delete_account() -> ApiRequest {
  ApiRequest::delete("users/me/")
}
