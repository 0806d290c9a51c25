use serde::Serialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::http::ApiRequest;

/// Account creation form. `password_confirmation` is checked locally and
/// never sent.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
  pub username: String,
  pub email: String,
  pub password: String,
  #[serde(skip)]
  pub password_confirmation: String,
}

#[derive(Clone, Serialize)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("email", &self.email)
      .field("password", &"***")
      .finish()
  }
}

pub fn register(form: &Registration) -> ApiResult<ApiRequest> {
  ApiRequest::post("auth/register/").json_from(form)
}

pub fn login(credentials: &Credentials) -> ApiResult<ApiRequest> {
  ApiRequest::post("auth/login/").json_from(credentials)
}

/// Blacklist `refresh` on the server.
pub fn logout(refresh: &str) -> ApiRequest {
  ApiRequest::post("auth/logout/").json(json!({ "refresh": refresh }))
}

pub fn refresh_token(refresh: &str) -> ApiRequest {
  ApiRequest::post("users/refresh/").json(json!({ "refresh": refresh }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Body;

  #[test]
  fn test_confirmation_not_sent() {
    let form = Registration {
      username: "ana".into(),
      email: "ana@example.com".into(),
      password: "hunter22!".into(),
      password_confirmation: "hunter22!".into(),
    };
    let req = register(&form).unwrap();
    assert_eq!(
      req.body,
      Body::Json(json!({"username": "ana", "email": "ana@example.com", "password": "hunter22!"}))
    );
  }

  #[test]
  fn test_credentials_debug_hides_password() {
    let creds = Credentials {
      email: "ana@example.com".into(),
      password: "secret".into(),
    };
    assert!(!format!("{:?}", creds).contains("secret"));
  }
}
