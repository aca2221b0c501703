//! Bounded retry for gateway calls.
//!
//! Every attempt runs under its own timeout. Only transient failures are
//! retried; anything else is returned after the attempt that produced it.

use crate::error::GatewayError;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Constant delay between attempts.
    Fixed,
    /// Delay doubles after each failed attempt, capped at `max_delay`.
    Exponential { max_delay: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(5),
            backoff: Backoff::Fixed,
        }
    }
}

/// The last error seen and how many attempts were spent producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: GatewayError,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor).min(max_delay)
            }
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    pub async fn run<T, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(self.attempt_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(self.attempt_timeout)),
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation = operation_name, attempt, "gateway call recovered");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= max_attempts {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "gateway call failed, giving up"
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }

            let delay = self.delay_after(attempt);
            tracing::debug!(
                operation = operation_name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient gateway failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::from_millis(1))
            .with_timeout(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = quick(3)
            .run("create_order", || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(GatewayError::Transport("connection reset".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = quick(2)
            .run("fetch_order", || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    Err(GatewayError::Upstream {
                        status: 503,
                        message: format!("attempt {n}"),
                    })
                }
            })
            .await;
        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 2);
        assert_eq!(
            exhausted.last_error,
            GatewayError::Upstream {
                status: 503,
                message: "attempt 2".into()
            }
        );
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = quick(5)
            .run("create_order", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(GatewayError::Upstream {
                        status: 400,
                        message: "order_amount invalid".into(),
                    })
                }
            })
            .await;
        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_attempt_times_out_and_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let policy = RetryPolicy::fixed(2, Duration::from_millis(1))
            .with_timeout(Duration::from_millis(20));
        let result = policy
            .run("fetch_order", || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                    Ok::<_, GatewayError>("PAID")
                }
            })
            .await;
        assert_eq!(result, Ok("PAID"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 6,
            delay: Duration::from_millis(100),
            attempt_timeout: Duration::from_secs(1),
            backoff: Backoff::Exponential {
                max_delay: Duration::from_millis(500),
            },
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
        assert_eq!(policy.delay_after(4), Duration::from_millis(500));
        assert_eq!(
            RetryPolicy::fixed(3, Duration::from_millis(250)).delay_after(3),
            Duration::from_millis(250)
        );
    }
}
