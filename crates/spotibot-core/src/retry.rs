use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::ProviderError;

/// Randomized exponential backoff around a single provider call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    multiplier: Duration,
    max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(40))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, multiplier: Duration, max_wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier,
            max_wait,
        }
    }

    /// No waiting between attempts; used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Upper bound of the wait after failed attempt `attempt` (0-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exp = 2f64.powi(attempt.min(30) as i32);
        let secs = (self.multiplier.as_secs_f64() * exp).min(self.max_wait.as_secs_f64());
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Uniform in `[0, ceiling(attempt)]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let cap = self.ceiling(attempt).as_secs_f64();
        if cap <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..=cap))
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    /// The last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let wait = self.backoff(attempt);
                    warn!(
                        "attempt {}/{} failed: {}; retrying in {:.1}s",
                        attempt + 1,
                        self.max_attempts,
                        e,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> ProviderError {
        ProviderError::Status {
            provider: "openai",
            status: 502,
            body: "bad gateway".into(),
        }
    }

    #[test]
    fn test_ceiling_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.ceiling(0), Duration::from_secs(1));
        assert_eq!(policy.ceiling(2), Duration::from_secs(4));
        assert_eq!(policy.ceiling(10), Duration::from_secs(40));
    }

    #[test]
    fn test_backoff_within_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 0..6 {
            assert!(policy.backoff(attempt) <= policy.ceiling(attempt));
        }
        assert_eq!(RetryPolicy::immediate(3).backoff(4), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(server_error()) }
            })
            .await;
        assert!(matches!(result, Err(ProviderError::Status { status: 502, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::immediate(3)
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(server_error())
                    } else {
                        Ok("hello")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ProviderError::Status {
                        provider: "openai",
                        status: 401,
                        body: "invalid key".into(),
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
