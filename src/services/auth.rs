use serde_json::Value;

use super::ResultExt;
use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::TokenPair;
use crate::requests::auth::{self, Credentials, Registration};

#[derive(Clone)]
pub struct AuthService {
  client: ApiClient,
}

impl AuthService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn register(&self, form: &Registration) -> ApiResult<Value> {
    self
      .client
      .execute_public(auth::register(form)?)
      .await
      .context("Registration failed")
  }

  pub async fn login(&self, credentials: &Credentials) -> ApiResult<TokenPair> {
    self
      .client
      .execute_public(auth::login(credentials)?)
      .await
      .context("Login failed")
  }

  pub async fn logout(&self, refresh: &str) -> ApiResult<()> {
    self
      .client
      .execute_unit(auth::logout(refresh))
      .await
      .context("Logout failed")
  }
}
