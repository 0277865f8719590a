//! Bounded exponential backoff for calls to remote collaborators.

use std::{fmt::Display, future::Future, time::Duration};

use serde::Deserialize;
use tracing::warn;

/// How many times to try an operation, and how long to wait in between.
///
/// The wait before retry `k` (1-based) is `base * 2^(k-1)`, capped at `max`.
/// With the defaults that is 4 s, then 8 s, over three attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  pub attempts:  u32,
  pub base_secs: u64,
  pub max_secs:  u64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      attempts:  3,
      base_secs: 4,
      max_secs:  10,
    }
  }
}

impl RetryPolicy {
  /// Try exactly once.
  pub const fn once() -> Self {
    Self {
      attempts:  1,
      base_secs: 0,
      max_secs:  0,
    }
  }

  /// Wait before retry number `retry` (1-based).
  pub fn delay(&self, retry: u32) -> Duration {
    let factor = 1u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
    let secs = self.base_secs.saturating_mul(factor).min(self.max_secs);
    Duration::from_secs(secs)
  }

  /// Run `op` until it succeeds or the attempts are used up, returning the
  /// last error. Each failed attempt is logged at `warn`.
  pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
  {
    let attempts = self.attempts.max(1);
    let mut attempt = 1;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(e) if attempt < attempts => {
          let delay = self.delay(attempt);
          warn!(
            attempt,
            attempts,
            delay_secs = delay.as_secs(),
            error = %e,
            "{what} failed; retrying"
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }
}
