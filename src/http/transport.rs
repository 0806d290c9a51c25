//! The single place that touches the network.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::request::{ApiRequest, Body};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Status and body of an HTTP response, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl RawResponse {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      body: body.into(),
    }
  }

  pub fn json(status: u16, value: &Value) -> Self {
    Self::new(status, value.to_string())
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Body parsed as JSON, if it is JSON.
  pub fn payload(&self) -> Option<Value> {
    if self.body.iter().all(u8::is_ascii_whitespace) {
      return None;
    }
    serde_json::from_slice(&self.body).ok()
  }

  /// Turn a non-2xx response into an error.
  pub fn error_for_status(self) -> ApiResult<Self> {
    if self.is_success() {
      Ok(self)
    } else {
      Err(ApiError::from_status(self.status, self.payload()))
    }
  }
}

/// Sends one request attempt. Never retries and never refreshes; both are
/// layered on top by the client.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> ApiResult<RawResponse>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
  http: reqwest::Client,
  base_url: Url,
  timeout: Duration,
}

impl ReqwestTransport {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let mut base = config.base_url.clone();
    if !base.ends_with('/') {
      base.push('/');
    }
    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("pictura/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      timeout: Duration::from_secs(config.timeout_secs),
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn url_for(&self, request: &ApiRequest) -> ApiResult<Url> {
    if request.path.split('/').any(is_dot_segment) {
      return Err(ApiError::validation(format!("Invalid request path {}", request.path)));
    }

    let mut url = self
      .base_url
      .join(&request.path)
      .map_err(|e| ApiError::validation(format!("Invalid request path {}: {}", request.path, e)))?;

    if !request.query.is_empty() {
      let mut pairs = url.query_pairs_mut();
      for (k, v) in request.query.iter() {
        pairs.append_pair(k, v);
      }
    }

    Ok(url)
  }
}

/// `.` or `..`, in any spelling the URL parser resolves against the base.
fn is_dot_segment(segment: &str) -> bool {
  let plain = segment.to_ascii_lowercase().replace("%2e", ".");
  plain == "." || plain == ".."
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> ApiResult<RawResponse> {
    let url = self.url_for(request)?;

    let mut builder = self
      .http
      .request(request.method.clone(), url)
      .timeout(request.timeout.unwrap_or(self.timeout))
      .header(reqwest::header::ACCEPT, "application/json");

    if let Some(token) = bearer {
      builder = builder.bearer_auth(token);
    }

    builder = match &request.body {
      Body::Empty => builder,
      Body::Json(value) => builder.json(value),
      Body::Multipart(form) => builder.multipart(form.to_multipart()?),
    };

    tracing::debug!(method = %request.method, path = %request.path, "sending request");

    let response = builder.send().await.map_err(|e| {
      if e.is_timeout() {
        ApiError::network(format!("Request to {} timed out", request.path))
      } else {
        ApiError::network(format!("Request to {} failed: {}", request.path, e))
      }
    })?;

    let status = response.status().as_u16();
    let body = response
      .bytes()
      .await
      .map_err(|e| ApiError::network(format!("Failed to read response from {}: {}", request.path, e)))?;

    Ok(RawResponse::new(status, body.to_vec()))
  }
}
