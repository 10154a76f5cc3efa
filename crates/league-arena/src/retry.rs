//! Fixed-count, fixed-delay retry for a single upstream call.

use std::future::Future;

use league_core::{Result, agent::RetryPolicy};
use tracing::warn;

/// Run `op` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` attempts have been made.
pub(crate) async fn with_retry<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let max_attempts = policy.max_attempts.max(1);
  let mut attempt = 1;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(e) if e.is_retryable() && attempt < max_attempts => {
        warn!(attempt, max_attempts, error = %e, "{what} failed, retrying");
        tokio::time::sleep(policy.delay()).await;
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}
