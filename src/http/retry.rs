//! Fixed-delay retry for server-class failures.

use std::future::Future;
use std::time::Duration;

use crate::error::ApiResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Retries after the first attempt
  pub max_retries: u32,
  /// Pause between attempts; does not grow
  pub delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      delay: Duration::from_secs(1),
    }
  }
}

impl RetryPolicy {
  /// No retries at all.
  pub fn none() -> Self {
    Self {
      max_retries: 0,
      delay: Duration::ZERO,
    }
  }
}

/// Run `op`, retrying server-class failures up to `policy.max_retries` times.
///
/// Client errors, authentication errors and local errors are returned after
/// the first attempt.
pub async fn retry_request<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> ApiResult<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = ApiResult<T>>,
{
  let mut attempt = 0u32;

  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(err) => {
        if attempt >= policy.max_retries || !err.is_retryable() {
          return Err(err);
        }
        attempt += 1;
        tracing::warn!(
          attempt,
          max_retries = policy.max_retries,
          status = ?err.status,
          "request failed, retrying: {}",
          err
        );
        tokio::time::sleep(policy.delay).await;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{ApiError, ErrorKind};
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  fn failing_then_ok(
    failures: u32,
    status: u16,
    calls: Arc<AtomicU32>,
  ) -> impl FnMut() -> std::future::Ready<ApiResult<&'static str>> {
    move || {
      let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
      if n <= failures {
        std::future::ready(Err(ApiError::from_status(status, None)))
      } else {
        std::future::ready(Ok("done"))
      }
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_server_errors_then_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let started = tokio::time::Instant::now();

    let result = retry_request(&RetryPolicy::default(), failing_then_ok(2, 503, calls.clone())).await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // two fixed one-second pauses, no backoff
    assert_eq!(started.elapsed(), Duration::from_secs(2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_client_error_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));

    let result = retry_request(&RetryPolicy::default(), failing_then_ok(5, 400, calls.clone())).await;

    assert_eq!(result.unwrap_err().kind, ErrorKind::Client);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_unauthenticated_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));

    let result = retry_request(&RetryPolicy::default(), failing_then_ok(5, 401, calls.clone())).await;

    assert!(result.unwrap_err().is_unauthenticated());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_gives_up_after_max_retries() {
    let calls = Arc::new(AtomicU32::new(0));

    let result = retry_request(&RetryPolicy::default(), failing_then_ok(10, 500, calls.clone())).await;

    assert_eq!(result.unwrap_err().status, Some(500));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
  }

  #[tokio::test]
  async fn test_network_errors_are_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let policy = RetryPolicy {
      max_retries: 3,
      delay: Duration::ZERO,
    };

    let result = retry_request(&policy, move || {
      let n = counter.fetch_add(1, Ordering::SeqCst);
      async move {
        if n == 0 {
          Err(ApiError::network("connection reset"))
        } else {
          Ok(n)
        }
      }
    })
    .await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
