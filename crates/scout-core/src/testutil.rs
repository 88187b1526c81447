//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks use
//! `Arc<Mutex<_>>` for interior mutability, allowing test assertions on
//! recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde_json::Value;

use crate::config::ScraperConfig;
use crate::context::ScrapeContext;
use crate::error::AppError;
use crate::models::{CanonicalJob, Enrichment, Source};
use crate::retry::RetryPolicy;
use crate::throttle::{Clock, Sleeper};
use crate::traits::{Enricher, FeedFetcher, FeedRequest};

// ---------------------------------------------------------------------------
// MockFeedFetcher
// ---------------------------------------------------------------------------

/// Serves canned feeds per source.
///
/// Scripted results are consumed first, in order. After that the source's
/// standing feed (if any) is returned on every call.
#[derive(Clone, Default)]
pub struct MockFeedFetcher {
    scripted: Arc<Mutex<HashMap<Source, Vec<Result<Value, AppError>>>>>,
    feeds: Arc<Mutex<HashMap<Source, Value>>>,
    calls: Arc<Mutex<Vec<Source>>>,
}

impl MockFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(self, source: Source, feed: Value) -> Self {
        self.feeds.lock().unwrap().insert(source, feed);
        self
    }

    pub fn with_error(self, source: Source, error: AppError) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(source)
            .or_default()
            .push(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<Source> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, source: Source) -> usize {
        self.calls().iter().filter(|s| **s == source).count()
    }
}

impl FeedFetcher for MockFeedFetcher {
    async fn fetch_feed(&self, request: &FeedRequest) -> Result<Value, AppError> {
        self.calls.lock().unwrap().push(request.source);

        if let Some(queue) = self.scripted.lock().unwrap().get_mut(&request.source)
            && !queue.is_empty()
        {
            return queue.remove(0);
        }

        self.feeds
            .lock()
            .unwrap()
            .get(&request.source)
            .cloned()
            .ok_or_else(|| AppError::HttpError(format!("HTTP 404 for {}", request.url)))
    }
}

// ---------------------------------------------------------------------------
// ManualClock / RecordingSleeper
// ---------------------------------------------------------------------------

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

/// Records requested sleeps instead of sleeping. Optionally advances a
/// [`ManualClock`] by the slept amount.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
    clock: Option<ManualClock>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advancing(clock: ManualClock) -> Self {
        Self {
            slept: Arc::default(),
            clock: Some(clock),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
    }
}

/// Context on a manual clock with jitter-free retries and a fixed day
/// (2026-01-15). Returns the sleeper so tests can inspect it.
pub fn test_context(rpm: u32) -> (ScrapeContext<ManualClock, RecordingSleeper>, RecordingSleeper) {
    let config = ScraperConfig {
        rpm,
        ..ScraperConfig::default()
    };
    let clock = ManualClock::new();
    let sleeper = RecordingSleeper::advancing(clock.clone());
    let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    let ctx = ScrapeContext::new(&config, clock, sleeper.clone(), today)
        .with_retry_policy(RetryPolicy::from_config(&config).without_jitter());
    (ctx, sleeper)
}

// ---------------------------------------------------------------------------
// Enrichers
// ---------------------------------------------------------------------------

/// Tags every job with its lowercased title.
#[derive(Clone, Default)]
pub struct TitleEnricher;

impl Enricher for TitleEnricher {
    fn enrich(&self, job: &CanonicalJob) -> Result<Enrichment, AppError> {
        Ok(Enrichment {
            normalized_title: job.title.to_lowercase(),
            seniority: "mid".into(),
            domain_tags: vec![],
            stack: vec![],
            skills: vec![],
            role_tags: vec![],
            stack_tags: vec![],
            remote_friendly: false,
        })
    }
}

/// Always fails.
#[derive(Clone, Default)]
pub struct FailingEnricher;

impl Enricher for FailingEnricher {
    fn enrich(&self, _job: &CanonicalJob) -> Result<Enrichment, AppError> {
        Err(AppError::EnrichmentError("model unavailable".into()))
    }
}
