//! Retry decisions for the fetch loop, kept free of I/O.

use std::time::Duration;

/// What a single attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
  Status(u16),
  /// Timeout, connection reset, DNS failure and the like
  TransportFault,
}

/// Transition taken after an attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryStep {
  Succeeded,
  /// Rate limited: wait, then attempt again with fresh headers
  Backoff(Duration),
  /// Attempt again immediately
  Retry,
  Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
  pub max_retries: u32,
  pub cap: Duration,
}

impl BackoffPolicy {
  pub fn new(max_retries: u32, cap: Duration) -> Self {
    Self { max_retries, cap }
  }

  /// `min(cap, 2^attempt + jitter)`, never shorter than `previous`.
  pub fn backoff_wait(&self, attempt: u32, jitter: Duration, previous: Duration) -> Duration {
    let exponential = Duration::from_secs(2u64.saturating_pow(attempt.min(32)));
    exponential
      .saturating_add(jitter)
      .max(previous)
      .min(self.cap)
  }

  /// Decide the next step for zero-based `attempt`.
  pub fn next_step(
    &self,
    attempt: u32,
    outcome: AttemptOutcome,
    jitter: Duration,
    previous_wait: Duration,
  ) -> RetryStep {
    if outcome == AttemptOutcome::Status(200) {
      return RetryStep::Succeeded;
    }

    let attempts_left = attempt + 1 < self.max_retries;
    if !attempts_left {
      return RetryStep::Exhausted;
    }

    match outcome {
      AttemptOutcome::Status(429) => {
        RetryStep::Backoff(self.backoff_wait(attempt, jitter, previous_wait))
      }
      _ => RetryStep::Retry,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn policy() -> BackoffPolicy {
    BackoffPolicy::new(5, Duration::from_secs(30))
  }

  #[test]
  fn test_ok_succeeds_on_any_attempt() {
    let p = policy();
    for attempt in 0..5 {
      assert_eq!(
        p.next_step(attempt, AttemptOutcome::Status(200), Duration::ZERO, Duration::ZERO),
        RetryStep::Succeeded
      );
    }
  }

  #[test]
  fn test_rate_limit_backs_off_exponentially() {
    let p = policy();
    let jitter = Duration::from_secs(1);
    assert_eq!(
      p.next_step(0, AttemptOutcome::Status(429), jitter, Duration::ZERO),
      RetryStep::Backoff(Duration::from_secs(2))
    );
    assert_eq!(
      p.next_step(2, AttemptOutcome::Status(429), jitter, Duration::ZERO),
      RetryStep::Backoff(Duration::from_secs(5))
    );
  }

  #[test]
  fn test_backoff_is_capped() {
    let p = BackoffPolicy::new(10, Duration::from_secs(30));
    assert_eq!(
      p.next_step(6, AttemptOutcome::Status(429), Duration::from_secs(2), Duration::ZERO),
      RetryStep::Backoff(Duration::from_secs(30))
    );
  }

  #[test]
  fn test_backoff_never_shrinks() {
    let p = policy();
    let wait = p.backoff_wait(1, Duration::from_millis(1000), Duration::from_millis(3900));
    assert_eq!(wait, Duration::from_millis(3900));
  }

  #[test]
  fn test_other_failures_retry_without_wait() {
    let p = policy();
    assert_eq!(
      p.next_step(0, AttemptOutcome::Status(503), Duration::ZERO, Duration::ZERO),
      RetryStep::Retry
    );
    assert_eq!(
      p.next_step(3, AttemptOutcome::TransportFault, Duration::ZERO, Duration::ZERO),
      RetryStep::Retry
    );
  }

  #[test]
  fn test_last_attempt_exhausts() {
    let p = policy();
    assert_eq!(
      p.next_step(4, AttemptOutcome::Status(429), Duration::ZERO, Duration::ZERO),
      RetryStep::Exhausted
    );
    assert_eq!(
      p.next_step(4, AttemptOutcome::TransportFault, Duration::ZERO, Duration::ZERO),
      RetryStep::Exhausted
    );
  }
}
