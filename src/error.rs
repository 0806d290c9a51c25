//! Uniform error shape for everything that talks to the API.
//!
//! Network failures, HTTP status failures and local validation failures are
//! all normalized into [`ApiError`], which carries a message, the HTTP status
//! (when there was a response) and the raw response payload.

use serde_json::Value;

/// Classification used by the retry wrapper and the refresh gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// 4xx other than 401: invalid input, not found, forbidden
  Client,
  /// 5xx
  Server,
  /// 401 that survived a refresh attempt, or no usable credentials
  Unauthenticated,
  /// No response at all (connect failure, timeout, reset)
  Network,
  /// Response arrived but the body did not match the expected shape
  Decode,
  /// Credential storage failed
  Storage,
  /// Rejected locally before any request was made
  Validation,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
  pub message: String,
  pub status: Option<u16>,
  pub payload: Option<Value>,
  pub kind: ErrorKind,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      status: None,
      payload: None,
      kind,
    }
  }

  /// Build an error from a non-success HTTP response.
  ///
  /// The message prefers what the server said (`message`, then `detail`,
  /// then the first field error) and falls back to the canonical reason.
  pub fn from_status(status: u16, payload: Option<Value>) -> Self {
    let kind = match status {
      401 => ErrorKind::Unauthenticated,
      400..=499 => ErrorKind::Client,
      _ => ErrorKind::Server,
    };

    let message = payload
      .as_ref()
      .and_then(server_message)
      .unwrap_or_else(|| {
        reqwest::StatusCode::from_u16(status)
          .ok()
          .and_then(|s| s.canonical_reason())
          .map(|reason| format!("{} {}", status, reason))
          .unwrap_or_else(|| format!("HTTP {}", status))
      });

    Self {
      message,
      status: Some(status),
      payload,
      kind,
    }
  }

  pub fn network(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Network, message)
  }

  pub fn unauthenticated(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Unauthenticated, message)
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Validation, message)
  }

  pub fn storage(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Storage, message)
  }

  pub fn decode(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Decode, message)
  }

  /// Prefix the message with what the caller was trying to do.
  /// Kind, status and payload are left untouched.
  pub fn context(mut self, what: &str) -> Self {
    self.message = format!("{}: {}", what, self.message);
    self
  }

  /// Server-class failures are worth another attempt. A request that never
  /// got a response counts as server-class too.
  pub fn is_retryable(&self) -> bool {
    matches!(self.kind, ErrorKind::Server | ErrorKind::Network)
  }

  pub fn is_unauthenticated(&self) -> bool {
    self.kind == ErrorKind::Unauthenticated
  }
}

/// Pull a human readable message out of a DRF-style error payload.
fn server_message(payload: &Value) -> Option<String> {
  let obj = payload.as_object()?;

  for field in ["message", "detail", "error"] {
    if let Some(Value::String(s)) = obj.get(field) {
      return Some(s.clone());
    }
  }

  // Field errors: {"username": ["already taken"]}
  obj.iter().find_map(|(field, value)| match value {
    Value::Array(items) => items
      .iter()
      .find_map(Value::as_str)
      .map(|msg| format!("{}: {}", field, msg)),
    Value::String(msg) => Some(format!("{}: {}", field, msg)),
    _ => None,
  })
}
