//! Single-flight gate for access token refreshes.
//!
//! When many requests hit a 401 at the same time only the first one talks to
//! the refresh endpoint; the others wait for its outcome and receive the same
//! token (or the same `None` if the refresh failed).

use std::future::Future;
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::lock;

type Waiter = oneshot::Sender<Option<String>>;

#[derive(Debug)]
enum GateState {
  Idle,
  Refreshing(Vec<Waiter>),
}

#[derive(Debug)]
pub struct RefreshGate {
  state: Mutex<GateState>,
}

impl Default for RefreshGate {
  fn default() -> Self {
    Self::new()
  }
}

impl RefreshGate {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(GateState::Idle),
    }
  }

  pub fn is_refreshing(&self) -> bool {
    matches!(*lock(&self.state), GateState::Refreshing(_))
  }

  /// Run `refresher` unless a refresh is already in flight, in which case
  /// wait for that one instead.
  pub async fn refresh<F, Fut>(&self, refresher: F) -> Option<String>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Option<String>>,
  {
    let waiter = {
      let mut state = lock(&self.state);
      match &mut *state {
        GateState::Idle => {
          *state = GateState::Refreshing(Vec::new());
          None
        }
        GateState::Refreshing(waiters) => {
          let (tx, rx) = oneshot::channel();
          waiters.push(tx);
          Some(rx)
        }
      }
    };

    if let Some(rx) = waiter {
      tracing::debug!("refresh already in flight, waiting");
      // A dropped leader closes the channel, which counts as failure.
      return rx.await.ok().flatten();
    }

    let mut leader = Leader {
      gate: self,
      finished: false,
    };
    let token = refresher().await;
    leader.finish(token.clone());
    token
  }

  fn release(&self, token: Option<String>) {
    let waiters = match std::mem::replace(&mut *lock(&self.state), GateState::Idle) {
      GateState::Refreshing(waiters) => waiters,
      GateState::Idle => Vec::new(),
    };
    for waiter in waiters {
      let _ = waiter.send(token.clone());
    }
  }
}

/// Puts the gate back to idle even if the leading future is dropped
/// mid-refresh.
struct Leader<'a> {
  gate: &'a RefreshGate,
  finished: bool,
}

impl Leader<'_> {
  fn finish(&mut self, token: Option<String>) {
    self.finished = true;
    self.gate.release(token);
  }
}

impl Drop for Leader<'_> {
  fn drop(&mut self) {
    if !self.finished {
      self.gate.release(None);
    }
  }
}
