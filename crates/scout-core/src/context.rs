use chrono::{NaiveDate, Utc};

use crate::config::ScraperConfig;
use crate::metrics::RunMetrics;
use crate::retry::RetryPolicy;
use crate::throttle::{Clock, RateLimiter, Sleeper, SystemClock, TokioSleeper};

/// Everything a run threads through the adapters: the shared rate limiter,
/// the retry policy, the run's metrics, and the date used for postings
/// without a usable date.
pub struct ScrapeContext<C = SystemClock, S = TokioSleeper> {
    pub limiter: RateLimiter<C, S>,
    pub retry: RetryPolicy,
    pub metrics: RunMetrics,
    pub today: NaiveDate,
}

impl ScrapeContext {
    /// Context on the real clock and tokio timers.
    pub fn live(config: &ScraperConfig) -> Self {
        Self::new(config, SystemClock, TokioSleeper, Utc::now().date_naive())
    }
}

impl<C: Clock, S: Sleeper> ScrapeContext<C, S> {
    pub fn new(config: &ScraperConfig, clock: C, sleeper: S, today: NaiveDate) -> Self {
        Self {
            limiter: RateLimiter::new(config.rpm, clock, sleeper),
            retry: RetryPolicy::from_config(config),
            metrics: RunMetrics::new(),
            today,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Zero the metrics for a new run.
    pub fn begin_run(&mut self) {
        self.metrics.reset();
        self.limiter.take_sleeps();
    }
}
