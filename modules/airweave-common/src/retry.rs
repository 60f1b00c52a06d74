use std::time::Duration;

/// Exponential backoff policy shared by source adapters (spec §4.1) and
/// destination adapters (spec §4.3). The baseline is three attempts with a
/// 1s multiplier, a 2s floor and a 10s ceiling.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given attempt (1-indexed). Attempt 1 has no delay;
    /// subsequent attempts back off exponentially, clamped to `[min_delay,
    /// max_delay]`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 2);
        let scaled = self.multiplier.saturating_mul(factor);
        scaled.clamp(self.min_delay, self.max_delay)
    }

    /// Run `op`, retrying transient failures up to `max_attempts` times.
    /// `is_transient` classifies whether a given error is worth retrying;
    /// a non-transient error returns immediately on the first attempt.
    pub async fn retry<T, E, F, Fut>(&self, is_transient: impl Fn(&E) -> bool, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && is_transient(&err) => {
                    let delay = self.delay_for_attempt(attempt + 1);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_clamps_between_min_and_max() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
        assert!(policy.delay_for_attempt(10) <= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn retry_stops_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            multiplier: Duration::from_millis(1),
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), &'static str> = policy
            .retry(|_: &&str| true, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom")
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_returns_immediately_on_non_transient_error() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result: Result<(), &'static str> = policy
            .retry(|_: &&str| false, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("fatal")
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
