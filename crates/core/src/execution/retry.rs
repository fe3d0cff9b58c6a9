//! Retry policy for transient failures
//!
//! Wraps a single asynchronous operation and re-invokes it on failure up to a
//! bounded number of attempts, waiting between attempts according to a
//! [`Backoff`]. Waits are cancellable.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::types::{ShipwrightError, ShipwrightResult};

/// Delay strategy between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles after every failed attempt, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential {
                initial: Duration::from_secs(1),
                max: Duration::from_secs(30),
            },
        }
    }
}

/// Failure after the policy gave up
#[derive(Debug)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub error: ShipwrightError,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Run `operation` until it succeeds or `max_attempts` attempts have failed
    ///
    /// A policy with `max_attempts == 0` still runs the operation once.
    /// Cancellation during a backoff wait returns [`ShipwrightError::Cancelled`]
    /// as the final error without another attempt.
    pub async fn invoke<T, F, Fut>(
        &self,
        mut operation: F,
        cancellation: &CancellationToken,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ShipwrightResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= max_attempts || matches!(error, ShipwrightError::Cancelled { .. }) {
                return Err(RetryExhausted {
                    attempts: attempt,
                    error,
                });
            }

            let delay = self.backoff.delay_for(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                %error,
                "attempt failed, retrying"
            );

            tokio::select! {
                _ = cancellation.cancelled() => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        error: ShipwrightError::Cancelled { completed: Vec::new() },
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Backoff::Fixed(Duration::from_millis(1)))
    }

    fn failing(count: u32) -> ShipwrightResult<u32> {
        Err(ShipwrightError::CommandFailed {
            command: format!("push #{count}"),
            exit_code: 1,
        })
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = &AtomicU32::new(0);
        let result = quick(3)
            .invoke(
                || async move {
                    let count = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        failing(count)
                    } else {
                        Ok(count)
                    }
                },
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result = quick(2)
            .invoke(
                || async move {
                    let count = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        failing(count)
                    } else {
                        Ok(count)
                    }
                },
                &CancellationToken::new(),
            )
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 2);
        assert!(matches!(
            exhausted.error,
            ShipwrightError::CommandFailed { ref command, .. } if command == "push #2"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let calls = &AtomicU32::new(0);
        let result = quick(0)
            .invoke(
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    failing(1)
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_backoff() {
        let token = &CancellationToken::new();
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Backoff::Fixed(Duration::from_secs(60)));
        let result = policy
            .invoke(
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    token.cancel();
                    failing(1)
                },
                token,
            )
            .await;

        let exhausted = result.unwrap_err();
        assert!(matches!(exhausted.error, ShipwrightError::Cancelled { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(5),
        };
        assert_eq!(backoff.delay_for(1), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(3), Duration::from_secs(4));
        assert_eq!(backoff.delay_for(4), Duration::from_secs(5));
        assert_eq!(backoff.delay_for(40), Duration::from_secs(5));
    }
}
