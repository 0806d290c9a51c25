//! Authorized request execution.
//!
//! Every call goes through the retry wrapper. Each attempt attaches the
//! stored access token; a 401 sends the attempt through the refresh gate and
//! replays it once with the new token.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

use super::refresh::RefreshGate;
use super::request::ApiRequest;
use super::retry::{retry_request, RetryPolicy};
use super::transport::{RawResponse, Transport};
use crate::credentials::TokenStore;
use crate::error::{ApiError, ApiResult};
use crate::events::{SyncBus, SyncEvent};
use crate::models::AccessToken;
use crate::requests;

#[derive(Clone)]
pub struct ApiClient {
  transport: Arc<dyn Transport>,
  tokens: Arc<dyn TokenStore>,
  gate: Arc<RefreshGate>,
  retry: RetryPolicy,
  sync: SyncBus,
}

impl ApiClient {
  pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenStore>, sync: SyncBus) -> Self {
    Self {
      transport,
      tokens,
      gate: Arc::new(RefreshGate::new()),
      retry: RetryPolicy::default(),
      sync,
    }
  }

  pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn tokens(&self) -> &Arc<dyn TokenStore> {
    &self.tokens
  }

  pub fn sync(&self) -> &SyncBus {
    &self.sync
  }

  /// Send `request` with credentials and decode the response body.
  pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
    let response = retry_request(&self.retry, || self.send_authorized(&request)).await?;
    decode(&request, &response)
  }

  /// Like [`execute`](Self::execute) for endpoints whose body is irrelevant.
  pub async fn execute_unit(&self, request: ApiRequest) -> ApiResult<()> {
    retry_request(&self.retry, || self.send_authorized(&request)).await?;
    Ok(())
  }

  /// Send `request` without credentials. A 401 here is final: login and
  /// registration answer 401 for bad credentials, not for an expired token.
  pub async fn execute_public<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
    let response = retry_request(&self.retry, || self.send_public(&request)).await?;
    decode(&request, &response)
  }

  /// Get a new access token, or join the refresh already in flight.
  ///
  /// On failure the stored credentials are cleared and
  /// [`SyncEvent::SessionExpired`] is published.
  pub async fn refresh_access_token(&self) -> Option<String> {
    self.gate.refresh(|| self.perform_refresh()).await
  }

  fn access_token(&self) -> ApiResult<Option<String>> {
    self
      .tokens
      .access_token()
      .map_err(|e| ApiError::storage(format!("Failed to read access token: {}", e)))
  }

  async fn send_public(&self, request: &ApiRequest) -> ApiResult<RawResponse> {
    let response = self.transport.send(request, None).await?;
    check_status(request, response)
  }

  async fn send_authorized(&self, request: &ApiRequest) -> ApiResult<RawResponse> {
    let sent = self.access_token()?;
    let response = self.transport.send(request, sent.as_deref()).await?;
    if response.status != 401 {
      return check_status(request, response);
    }

    // Another request may have refreshed while this one was in flight.
    let current = self.access_token()?;
    let fresh = match current {
      Some(token) if Some(&token) != sent.as_ref() => Some(token),
      _ => {
        tracing::debug!(path = %request.path, "access token rejected, refreshing");
        self.refresh_access_token().await
      }
    };

    let Some(token) = fresh else {
      return Err(ApiError::from_status(401, response.payload()));
    };

    let replay = self.transport.send(request, Some(&token)).await?;
    check_status(request, replay)
  }

  async fn perform_refresh(&self) -> Option<String> {
    match self.try_refresh().await {
      Ok(token) => {
        tracing::info!("access token refreshed");
        Some(token)
      }
      Err(err) => {
        tracing::warn!("token refresh failed: {}", err);
        self.expire_session();
        None
      }
    }
  }

  async fn try_refresh(&self) -> ApiResult<String> {
    let refresh = self
      .tokens
      .refresh_token()
      .map_err(|e| ApiError::storage(format!("Failed to read refresh token: {}", e)))?
      .ok_or_else(|| ApiError::unauthenticated("No refresh token stored"))?;

    let token: AccessToken = self
      .execute_public(requests::auth::refresh_token(&refresh))
      .await?;

    self
      .tokens
      .set_access_token(&token.access)
      .map_err(|e| ApiError::storage(format!("Failed to store access token: {}", e)))?;

    Ok(token.access)
  }

  fn expire_session(&self) {
    if let Err(e) = self.tokens.clear() {
      tracing::error!("failed to clear credentials: {}", e);
    }
    self.sync.notify(SyncEvent::SessionExpired, json!({}));
  }
}

fn check_status(request: &ApiRequest, response: RawResponse) -> ApiResult<RawResponse> {
  if response.status == 403 {
    tracing::warn!(path = %request.path, "access forbidden");
  }
  response.error_for_status()
}

fn decode<T: DeserializeOwned>(request: &ApiRequest, response: &RawResponse) -> ApiResult<T> {
  let result = if response.body.iter().all(u8::is_ascii_whitespace) {
    serde_json::from_value(Value::Null)
  } else {
    serde_json::from_slice(&response.body)
  };

  result.map_err(|e| {
    let mut err = ApiError::decode(format!("Unexpected response from {}: {}", request.path, e));
    err.status = Some(response.status);
    err.payload = response.payload();
    err
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::credentials::MemoryTokenStore;
  use crate::error::ErrorKind;
  use crate::test_support::{client_for, tokens_with};
  use futures::future::join_all;
  use std::sync::Mutex;
  use std::time::Duration;
  use wiremock::matchers::{body_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_attaches_stored_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/photos/1/"))
      .and(header("authorization", "Bearer access-1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server, tokens_with("access-1", "refresh-1"));
    let value: Value = client.execute(ApiRequest::get("photos/1/")).await.unwrap();

    assert_eq!(value, json!({"id": 1}));
  }

  #[tokio::test]
  async fn test_empty_body_decodes_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/photos/1/"))
      .respond_with(ResponseTemplate::new(204))
      .mount(&server)
      .await;

    let client = client_for(&server, tokens_with("a", "r"));
    let value: Option<Value> = client.execute(ApiRequest::delete("photos/1/")).await.unwrap();

    assert_eq!(value, None);
  }

  #[tokio::test]
  async fn test_single_refresh_for_concurrent_401s() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(header("authorization", "Bearer stale"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(header("authorization", "Bearer fresh"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
      .expect(5)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/users/refresh/"))
      .and(body_json(json!({"refresh": "refresh-1"})))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({"access": "fresh"}))
          .set_delay(Duration::from_millis(100)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let tokens = tokens_with("stale", "refresh-1");
    let client = client_for(&server, tokens.clone());

    let calls = (1..=5).map(|id| client.execute::<Value>(ApiRequest::get(format!("photos/{}/", id))));
    let results = join_all(calls).await;

    for result in results {
      assert_eq!(result.unwrap(), json!({"ok": true}));
    }
    assert_eq!(tokens.access_token().unwrap().as_deref(), Some("fresh"));
    assert_eq!(tokens.refresh_token().unwrap().as_deref(), Some("refresh-1"));
  }

  #[tokio::test]
  async fn test_failed_refresh_fails_every_waiter_and_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/users/refresh/"))
      .respond_with(
        ResponseTemplate::new(401)
          .set_body_json(json!({"detail": "Token is blacklisted"}))
          .set_delay(Duration::from_millis(100)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let tokens = tokens_with("stale", "revoked");
    let client = client_for(&server, tokens.clone());
    let expired = Arc::new(Mutex::new(0));
    let seen = expired.clone();
    client
      .sync()
      .subscribe(SyncEvent::SessionExpired, move |_| *seen.lock().unwrap() += 1);

    let calls = (1..=5).map(|id| client.execute::<Value>(ApiRequest::get(format!("photos/{}/", id))));
    let results = join_all(calls).await;

    for result in results {
      let err = result.unwrap_err();
      assert_eq!(err.kind, ErrorKind::Unauthenticated);
      assert_eq!(err.status, Some(401));
    }
    assert!(!tokens.has_tokens().unwrap());

    client.sync().flush();
    assert_eq!(*expired.lock().unwrap(), 1);
  }

  #[tokio::test]
  async fn test_second_401_after_refresh_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/users/me/"))
      .respond_with(ResponseTemplate::new(401))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/users/refresh/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "fresh"})))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server, tokens_with("stale", "r"));
    let err = client
      .execute::<Value>(ApiRequest::get("users/me/"))
      .await
      .unwrap_err();

    assert!(err.is_unauthenticated());
  }

  #[tokio::test]
  async fn test_missing_refresh_token_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;

    let tokens = Arc::new(MemoryTokenStore::new());
    tokens.set_access_token("orphan").unwrap();
    let client = client_for(&server, tokens.clone());

    let err = client
      .execute::<Value>(ApiRequest::get("users/me/"))
      .await
      .unwrap_err();

    assert!(err.is_unauthenticated());
    assert!(tokens.access_token().unwrap().is_none());
  }

  #[tokio::test]
  async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(503))
      .up_to_n_times(2)
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server, tokens_with("a", "r"));
    let value: Value = client.execute(ApiRequest::get("photos/feed/")).await.unwrap();

    assert_eq!(value, json!([]));
  }

  #[tokio::test]
  async fn test_client_errors_keep_status_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({"name": ["This field is required."]})))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server, tokens_with("a", "r"));
    let err = client
      .execute::<Value>(ApiRequest::post("collections/collections/").json(json!({})))
      .await
      .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Client);
    assert_eq!(err.status, Some(400));
    assert_eq!(err.payload, Some(json!({"name": ["This field is required."]})));
  }

  #[tokio::test]
  async fn test_public_401_does_not_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/auth/login/"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/users/refresh/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "x"})))
      .expect(0)
      .mount(&server)
      .await;

    let client = client_for(&server, tokens_with("a", "r"));
    let err = client
      .execute_public::<Value>(ApiRequest::post("auth/login/").json(json!({})))
      .await
      .unwrap_err();

    assert_eq!(err.message, "Invalid credentials");
  }
}
