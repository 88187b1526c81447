//! Bounded retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::ScraperConfig;
use crate::error::AppError;
use crate::throttle::Sleeper;

/// Backoff schedule for [`with_retry`].
///
/// Delay before retry `n` (1-indexed) is
/// `min(backoff_max, backoff_base * 2^(n-1))` plus uniform jitter in `[0, jitter)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScraperConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: secs(config.backoff_base_secs),
            backoff_max: secs(config.backoff_max_secs),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// Disable jitter, e.g. for deterministic tests.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = Duration::ZERO;
        self
    }

    /// Exponential part of the delay, capped at `backoff_max`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_base
            .saturating_mul(1u32 << exponent)
            .min(self.backoff_max)
    }

    /// Full delay including jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let jitter_ms = rand_jitter_ms(self.jitter.as_millis() as u64);
        self.base_delay(attempt) + Duration::from_millis(jitter_ms)
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// What happened during a retried call.
#[derive(Debug)]
pub enum RetryEvent<'a> {
    /// The operation failed on this attempt.
    Failed { attempt: u32, error: &'a AppError },
    /// Another attempt follows after `delay`.
    Retrying {
        attempt: u32,
        delay: Duration,
        error: &'a AppError,
    },
    /// No attempts left.
    Exhausted { attempts: u32, error: &'a AppError },
}

/// Receives retry events (decoupled logging and metrics).
pub trait RetryReporter {
    fn report(&mut self, event: RetryEvent<'_>) {
        let _ = event;
    }
}

impl RetryReporter for () {}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRetryReporter;

impl RetryReporter for TracingRetryReporter {
    fn report(&mut self, event: RetryEvent<'_>) {
        match event {
            RetryEvent::Failed { attempt, error } => {
                tracing::debug!(attempt, %error, "Attempt failed");
            }
            RetryEvent::Retrying {
                attempt,
                delay,
                error,
            } => {
                tracing::info!(attempt, delay_ms = %delay.as_millis(), %error, "Retrying");
            }
            RetryEvent::Exhausted { attempts, error } => {
                tracing::warn!(attempts, %error, "Giving up");
            }
        }
    }
}

/// Every attempt failed.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: AppError,
}

/// Run `operation` until it succeeds or `max_retries + 1` attempts have failed.
///
/// Sleeps between attempts via `sleeper`, never after the final failure.
pub async fn with_retry<T, F, Fut, S, R>(
    policy: &RetryPolicy,
    sleeper: &S,
    reporter: &mut R,
    mut operation: F,
) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
    S: Sleeper,
    R: RetryReporter + ?Sized,
{
    let mut attempts = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempts += 1;
                reporter.report(RetryEvent::Failed {
                    attempt: attempts,
                    error: &error,
                });

                if attempts > policy.max_retries {
                    reporter.report(RetryEvent::Exhausted {
                        attempts,
                        error: &error,
                    });
                    return Err(RetryExhausted {
                        attempts,
                        last_error: error,
                    });
                }

                let delay = policy.delay_for_attempt(attempts);
                reporter.report(RetryEvent::Retrying {
                    attempt: attempts,
                    delay,
                    error: &error,
                });
                sleeper.sleep(delay).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Jitter from a time-seeded xorshift, so the `rand` crate isn't needed.
// ---------------------------------------------------------------------------

fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    // xorshift64
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::testutil::RecordingSleeper;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(4),
            jitter: Duration::ZERO,
        }
    }

    #[derive(Default)]
    struct CollectingReporter {
        events: Vec<String>,
    }

    impl RetryReporter for CollectingReporter {
        fn report(&mut self, event: RetryEvent<'_>) {
            let line = match event {
                RetryEvent::Failed { attempt, .. } => format!("failed:{attempt}"),
                RetryEvent::Retrying { attempt, .. } => format!("retrying:{attempt}"),
                RetryEvent::Exhausted { attempts, .. } => format!("exhausted:{attempts}"),
            };
            self.events.push(line);
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = policy(3);
        assert_eq!(p.base_delay(1), Duration::from_millis(500));
        assert_eq!(p.base_delay(2), Duration::from_secs(1));
        assert_eq!(p.base_delay(3), Duration::from_secs(2));
        assert_eq!(p.base_delay(4), Duration::from_secs(4));
        assert_eq!(p.base_delay(5), Duration::from_secs(4));
        assert_eq!(p.base_delay(64), Duration::from_secs(4));
    }

    #[test]
    fn jitter_is_bounded() {
        let p = RetryPolicy {
            jitter: Duration::from_millis(50),
            ..policy(3)
        };
        for _ in 0..100 {
            let d = p.delay_for_attempt(1);
            assert!(d >= Duration::from_millis(500));
            assert!(d < Duration::from_millis(550));
        }
    }

    #[test]
    fn negative_config_values_do_not_panic() {
        let config = ScraperConfig {
            backoff_base_secs: -1.0,
            backoff_max_secs: f64::NAN,
            ..ScraperConfig::default()
        };
        let p = RetryPolicy::from_config(&config);
        assert_eq!(p.backoff_base, Duration::ZERO);
        assert_eq!(p.backoff_max, Duration::ZERO);
    }

    #[tokio::test]
    async fn always_failing_operation_is_called_max_retries_plus_one_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let sleeper = RecordingSleeper::new();
        let mut reporter = CollectingReporter::default();

        let result: Result<(), _> = with_retry(&policy(3), &sleeper, &mut reporter, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::NetworkError("down".into()))
            }
        })
        .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 4);
        assert!(matches!(exhausted.last_error, AppError::NetworkError(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // No sleep after the last failure.
        assert_eq!(
            sleeper.recorded(),
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ]
        );
        assert_eq!(
            reporter.events,
            [
                "failed:1", "retrying:1", "failed:2", "retrying:2", "failed:3", "retrying:3",
                "failed:4", "exhausted:4",
            ]
        );
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let sleeper = RecordingSleeper::new();

        let result = with_retry(&policy(3), &sleeper, &mut (), || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(AppError::Timeout(30))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(sleeper.recorded().len(), 2);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let sleeper = RecordingSleeper::new();

        let result: Result<(), _> = with_retry(&policy(0), &sleeper, &mut (), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::HttpError("HTTP 500".into()))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.recorded().is_empty());
    }
}
