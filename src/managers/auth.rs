use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::base::{ManagerEvent, ManagerState};
use crate::error::{ApiError, ApiResult};
use crate::events::{EventBus, Subscription, SyncEvent, WeakSyncBus};
use crate::http::ApiClient;
use crate::models::TokenPair;
use crate::requests::auth::{Credentials, Registration};
use crate::services::AuthService;
use crate::validation;

/// Session lifecycle: registration, login, logout and token refresh.
///
/// The authenticated flag follows the token store. It is raised by a login,
/// lowered by a logout or by the client giving up on an expired session,
/// and re-read from storage by [`is_authenticated`](Self::is_authenticated).
pub struct AuthManager {
  client: ApiClient,
  service: AuthService,
  state: ManagerState,
  flag: AuthFlag,
  expiry: Option<Subscription<SyncEvent, Value>>,
}

/// The authenticated flag and the buses told about its changes.
#[derive(Clone)]
struct AuthFlag {
  value: Arc<AtomicBool>,
  events: EventBus<ManagerEvent, Value>,
  sync: WeakSyncBus,
}

impl AuthFlag {
  fn set(&self, authenticated: bool) {
    if self.value.swap(authenticated, Ordering::SeqCst) == authenticated {
      return;
    }
    let payload = json!({ "authenticated": authenticated });
    self.events.emit(&ManagerEvent::AuthStateChanged, &payload);
    if let Some(sync) = self.sync.upgrade() {
      sync.notify(SyncEvent::AuthStateChanged, payload);
    }
  }
}

impl AuthManager {
  pub fn new(client: ApiClient, service: AuthService) -> Self {
    let state = ManagerState::new("auth");
    let authenticated = client.tokens().has_tokens().unwrap_or(false);
    let flag = AuthFlag {
      value: Arc::new(AtomicBool::new(authenticated)),
      events: state.events().clone(),
      sync: client.sync().downgrade(),
    };

    let on_expiry = flag.clone();
    let expiry = client
      .sync()
      .subscribe(SyncEvent::SessionExpired, move |_| on_expiry.set(false));

    Self {
      client,
      service,
      state,
      flag,
      expiry: Some(expiry),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  pub async fn register(&self, form: &Registration) -> ApiResult<Value> {
    self
      .state
      .track(async {
        validation::validate_registration(form).map_err(ApiError::from)?;
        self.service.register(form).await
      })
      .await
  }

  pub async fn login(&self, credentials: &Credentials) -> ApiResult<TokenPair> {
    self
      .state
      .track(async {
        let tokens = self.service.login(credentials).await?;
        self
          .client
          .tokens()
          .set_tokens(&tokens.access, &tokens.refresh)
          .map_err(|e| ApiError::storage(format!("Failed to store credentials: {}", e)))?;
        tracing::info!(email = %credentials.email, "logged in");
        self.set_auth_state(true);
        Ok(tokens)
      })
      .await
  }

  /// Blacklist the refresh token on the server and drop local credentials.
  ///
  /// Local credentials are dropped even when the server call fails; that
  /// failure is still reported.
  pub async fn logout(&self) -> ApiResult<()> {
    self
      .state
      .track(async {
        let refresh = self
          .client
          .tokens()
          .refresh_token()
          .map_err(|e| ApiError::storage(format!("Failed to read refresh token: {}", e)))?;

        let remote = match refresh {
          Some(refresh) => self.service.logout(&refresh).await,
          None => Ok(()),
        };

        self
          .client
          .tokens()
          .clear()
          .map_err(|e| ApiError::storage(format!("Failed to clear credentials: {}", e)))?;
        self.set_auth_state(false);
        remote
      })
      .await
  }

  /// Exchange the refresh token for a new access token. Joins a refresh
  /// already in flight.
  pub async fn refresh_session(&self) -> ApiResult<String> {
    self
      .state
      .track(async {
        match self.client.refresh_access_token().await {
          Some(token) => Ok(token),
          None => {
            self.set_auth_state(false);
            Err(ApiError::unauthenticated("Session expired"))
          }
        }
      })
      .await
  }

  pub fn is_authenticated(&self) -> bool {
    let stored = self.client.tokens().has_tokens().unwrap_or(false);
    self.set_auth_state(stored);
    stored
  }

  fn set_auth_state(&self, authenticated: bool) {
    self.flag.set(authenticated);
  }
}

impl Drop for AuthManager {
  fn drop(&mut self) {
    if let Some(expiry) = self.expiry.take() {
      expiry.unsubscribe();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::credentials::{MemoryTokenStore, TokenStore};
  use crate::error::ErrorKind;
  use crate::test_support::{client_for, tokens_with};
  use pretty_assertions::assert_eq;
  use std::sync::{Arc, Mutex};
  use wiremock::matchers::{body_json, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn credentials() -> Credentials {
    Credentials {
      email: "ana@example.com".into(),
      password: "hunter22!".into(),
    }
  }

  fn manager(client: &ApiClient) -> AuthManager {
    AuthManager::new(client.clone(), AuthService::new(client.clone()))
  }

  #[tokio::test]
  async fn test_login_stores_tokens_and_announces_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/auth/login/"))
      .and(body_json(json!({"email": "ana@example.com", "password": "hunter22!"})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})))
      .expect(2)
      .mount(&server)
      .await;

    let tokens = Arc::new(MemoryTokenStore::new());
    let client = client_for(&server, tokens.clone());
    let auth = manager(&client);
    let changes = Arc::new(Mutex::new(Vec::new()));
    let c = changes.clone();
    auth
      .state()
      .subscribe(ManagerEvent::AuthStateChanged, move |v| c.lock().unwrap().push(v.clone()));

    assert!(!auth.is_authenticated());
    auth.login(&credentials()).await.unwrap();
    auth.login(&credentials()).await.unwrap();

    assert!(auth.is_authenticated());
    assert_eq!(tokens.access_token().unwrap().as_deref(), Some("a1"));
    assert_eq!(tokens.refresh_token().unwrap().as_deref(), Some("r1"));
    assert_eq!(*changes.lock().unwrap(), vec![json!({"authenticated": true})]);
  }

  #[tokio::test]
  async fn test_bad_credentials_do_not_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/auth/login/"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "No active account found"})))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/users/refresh/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "x"})))
      .expect(0)
      .mount(&server)
      .await;

    let client = client_for(&server, Arc::new(MemoryTokenStore::new()));
    let auth = manager(&client);

    let err = auth.login(&credentials()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
    assert_eq!(err.message, "Login failed: No active account found");
    assert!(!auth.is_authenticated());
  }

  #[tokio::test]
  async fn test_logout_blacklists_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/auth/logout/"))
      .and(body_json(json!({"refresh": "refresh"})))
      .respond_with(ResponseTemplate::new(205))
      .expect(1)
      .mount(&server)
      .await;

    let tokens = tokens_with("access", "refresh");
    let client = client_for(&server, tokens.clone());
    let auth = manager(&client);
    assert!(auth.is_authenticated());

    auth.logout().await.unwrap();

    assert!(!auth.is_authenticated());
    assert!(!tokens.has_tokens().unwrap());
  }

  #[tokio::test]
  async fn test_logout_clears_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/auth/logout/"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Token is blacklisted"})))
      .mount(&server)
      .await;

    let tokens = tokens_with("access", "refresh");
    let client = client_for(&server, tokens.clone());
    let auth = manager(&client);

    let err = auth.logout().await.unwrap_err();
    assert_eq!(err.status, Some(400));
    assert!(!tokens.has_tokens().unwrap());
    assert!(!auth.is_authenticated());
  }

  #[tokio::test]
  async fn test_invalid_registration_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/auth/register/"))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "ok"})))
      .expect(0)
      .mount(&server)
      .await;

    let client = client_for(&server, Arc::new(MemoryTokenStore::new()));
    let auth = manager(&client);
    let form = Registration {
      username: "ana".into(),
      email: "ana@example.com".into(),
      password: "hunter22!".into(),
      password_confirmation: "different".into(),
    };

    let err = auth.register(&form).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
  }

  #[tokio::test]
  async fn test_failed_refresh_lowers_auth_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/users/refresh/"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is invalid or expired"})))
      .expect(1)
      .mount(&server)
      .await;

    let tokens = tokens_with("access", "refresh");
    let client = client_for(&server, tokens.clone());
    let auth = manager(&client);
    assert!(auth.is_authenticated());

    let err = auth.refresh_session().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
    assert!(!auth.is_authenticated());
    assert!(!tokens.has_tokens().unwrap());
  }
}
