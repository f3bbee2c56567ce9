use std::time::Duration;
use tracing::warn;

use crate::constants::constants;
use crate::error::SearchError;

/// Exponential backoff applied to quota-exhaustion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Delay before the first retry; doubled for each subsequent one.
  pub base_delay: Duration,
  /// Total attempts, including the first.
  pub max_attempts: u32,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      base_delay: Duration::from_millis(constants().retry_base_delay_ms),
      max_attempts: constants().retry_max_attempts,
    }
  }
}

impl RetryPolicy {
  /// Delay slept after the given failed attempt (1-based).
  pub fn delay_after(&self, attempt: u32) -> Duration {
    self.base_delay.saturating_mul(1u32 << attempt.saturating_sub(1).min(31))
  }
}

/// Run `op`, re-invoking it after a growing delay while it fails with a
/// quota-exhaustion error. Any other error, or the last quota error once
/// `max_attempts` is reached, is returned unchanged.
pub async fn retry_on_quota<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, SearchError>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, SearchError>>,
{
  let max_attempts = policy.max_attempts.max(1);
  let mut attempt = 1;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(e) if e.is_quota_exhausted() && attempt < max_attempts => {
        let delay = policy.delay_after(attempt);
        warn!(attempt, max_attempts, delay_ms = delay.as_millis() as u64, err = %e, "quota exhausted, backing off");
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};
  use tokio::time::Instant;

  fn quota() -> SearchError {
    SearchError::QuotaExceeded { status: 403, message: "quotaExceeded".to_string() }
  }

  /// Records the (paused) clock at every invocation and fails `failures` times.
  fn flaky(failures: usize, calls: Arc<Mutex<Vec<Instant>>>) -> impl FnMut() -> std::future::Ready<Result<u32, SearchError>> {
    move || {
      let mut calls = calls.lock().unwrap();
      calls.push(Instant::now());
      if calls.len() <= failures { std::future::ready(Err(quota())) } else { std::future::ready(Ok(42)) }
    }
  }

  fn gaps_ms(calls: &[Instant]) -> Vec<u128> {
    calls.windows(2).map(|w| (w[1] - w[0]).as_millis()).collect()
  }

  #[test]
  fn default_policy_from_constants() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.base_delay, Duration::from_millis(1000));
    assert_eq!(policy.max_attempts, 5);
  }

  #[test]
  fn delays_double() {
    let policy = RetryPolicy { base_delay: Duration::from_millis(1000), max_attempts: 5 };
    let delays: Vec<u128> = (1..=4).map(|a| policy.delay_after(a).as_millis()).collect();
    assert_eq!(delays, vec![1000, 2000, 4000, 8000]);
  }

  #[tokio::test(start_paused = true)]
  async fn succeeds_after_four_quota_failures() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let result = retry_on_quota(RetryPolicy::default(), flaky(4, calls.clone())).await;

    assert_eq!(result.unwrap(), 42);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 5);
    assert_eq!(gaps_ms(&calls), vec![1000, 2000, 4000, 8000]);
  }

  #[tokio::test(start_paused = true)]
  async fn gives_up_after_max_attempts() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let result = retry_on_quota(RetryPolicy::default(), flaky(usize::MAX, calls.clone())).await;

    let err = result.unwrap_err();
    assert!(matches!(err, SearchError::QuotaExceeded { status: 403, ref message } if message == "quotaExceeded"));
    assert_eq!(calls.lock().unwrap().len(), 5);
  }

  #[tokio::test(start_paused = true)]
  async fn other_errors_are_not_retried() {
    let mut calls = 0;
    let start = Instant::now();
    let result: Result<(), _> = retry_on_quota(RetryPolicy::default(), || {
      calls += 1;
      std::future::ready(Err(SearchError::Forbidden { message: "nope".to_string() }))
    })
    .await;

    assert!(matches!(result, Err(SearchError::Forbidden { .. })));
    assert_eq!(calls, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn first_success_does_not_wait() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let result = retry_on_quota(RetryPolicy::default(), flaky(0, calls.clone())).await;
    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.lock().unwrap().len(), 1);
  }
}
