//! Shared fixtures for tests that talk to a mock server.

use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

use crate::config::ApiConfig;
use crate::credentials::{MemoryTokenStore, TokenStore};
use crate::events::SyncBus;
use crate::http::{ApiClient, ReqwestTransport, RetryPolicy};

pub fn tokens_with(access: &str, refresh: &str) -> Arc<MemoryTokenStore> {
  let tokens = Arc::new(MemoryTokenStore::new());
  tokens.set_tokens(access, refresh).unwrap();
  tokens
}

/// Client against `server` with short retry delays.
pub fn client_for(server: &MockServer, tokens: Arc<dyn TokenStore>) -> ApiClient {
  let config = ApiConfig {
    base_url: format!("{}/api/", server.uri()),
    ..ApiConfig::default()
  };
  let transport = ReqwestTransport::new(&config).unwrap();
  ApiClient::new(Arc::new(transport), tokens, SyncBus::new()).with_retry_policy(RetryPolicy {
    max_retries: 3,
    delay: Duration::from_millis(10),
  })
}

/// Logged-in client against `server`.
pub fn session_for(server: &MockServer) -> ApiClient {
  client_for(server, tokens_with("access", "refresh"))
}
