use std::future::Future;
use std::time::Duration;

use prodmon_api::MonitorError;

/// Exponential backoff around a fallible outbound call.
///
/// Only transient errors are retried; anything else returns immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(200))
    }
}

impl RetryPolicy {
    pub fn exponential(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(5),
        }
    }

    pub fn none() -> Self {
        Self::exponential(1, Duration::ZERO)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub async fn run<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, MonitorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MonitorError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(op, attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy::exponential(10, Duration::from_millis(200));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(40), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_until_success() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::exponential(3, Duration::from_millis(10));
        let result = policy
            .run("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(MonitorError::StoreUnavailable("refused".into()))
                } else {
                    Ok(42)
                }
            })
            .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_last_attempt() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::exponential(2, Duration::from_millis(10))
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MonitorError::LookupUnavailable("timeout".into()))
            })
            .await;
        assert!(matches!(result, Err(MonitorError::LookupUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::default()
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MonitorError::LookupNotFound(9))
            })
            .await;
        assert_eq!(result, Err(MonitorError::LookupNotFound(9)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
