use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Source;
use crate::retry::{RetryEvent, RetryReporter};

/// Per-run counters.
///
/// Owned by the run's [`ScrapeContext`](crate::context::ScrapeContext) and
/// reset at the start of every run. Per-source maps are ordered so the
/// serialized form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMetrics {
    pub retries_attempted: u64,
    pub rate_limit_sleeps: u64,
    pub scraper_failures: u64,
    pub jobs_fetched: BTreeMap<Source, u64>,
    pub malformed_entries: BTreeMap<Source, u64>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn inc_jobs(&mut self, source: Source, n: u64) {
        *self.jobs_fetched.entry(source).or_insert(0) += n;
    }

    pub fn inc_malformed(&mut self, source: Source, n: u64) {
        *self.malformed_entries.entry(source).or_insert(0) += n;
    }

    /// An owned copy for the run summary.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.clone()
    }
}

/// Point-in-time copy of [`RunMetrics`], detached from the live context.
pub type MetricsSnapshot = RunMetrics;

/// Feeds retry events for one source into the run metrics.
pub struct MetricsReporter<'a> {
    metrics: &'a mut RunMetrics,
    source: Source,
}

impl<'a> MetricsReporter<'a> {
    pub fn new(metrics: &'a mut RunMetrics, source: Source) -> Self {
        Self { metrics, source }
    }
}

impl RetryReporter for MetricsReporter<'_> {
    fn report(&mut self, event: RetryEvent<'_>) {
        let source = self.source;
        match event {
            RetryEvent::Failed { attempt, error } => {
                tracing::warn!(
                    %source,
                    attempt,
                    transport = error.is_transport(),
                    %error,
                    "Fetch attempt failed"
                );
            }
            RetryEvent::Retrying { attempt, delay, .. } => {
                self.metrics.retries_attempted += 1;
                tracing::info!(%source, attempt, delay_ms = %delay.as_millis(), "Retrying fetch");
            }
            RetryEvent::Exhausted { attempts, error } => {
                tracing::error!(%source, attempts, %error, "Source failed after retries");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn counters_accumulate_per_source() {
        let mut m = RunMetrics::new();
        m.inc_jobs(Source::Lever, 3);
        m.inc_jobs(Source::Lever, 2);
        m.inc_malformed(Source::Greenhouse, 1);
        assert_eq!(m.jobs_fetched[&Source::Lever], 5);
        assert_eq!(m.malformed_entries[&Source::Greenhouse], 1);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut m = RunMetrics::new();
        m.inc_jobs(Source::Ashby, 1);
        let snap = m.snapshot();
        m.inc_jobs(Source::Ashby, 1);
        m.reset();
        assert_eq!(snap.jobs_fetched[&Source::Ashby], 1);
        assert_eq!(m, RunMetrics::default());
    }

    #[test]
    fn snapshot_serializes_with_source_keys() {
        let mut m = RunMetrics::new();
        m.inc_jobs(Source::GoogleJobs, 2);
        let value = serde_json::to_value(m.snapshot()).unwrap();
        assert_eq!(value["jobs_fetched"]["googlejobs"], 2);
        assert_eq!(value["retries_attempted"], 0);
    }

    #[test]
    fn reporter_counts_retries_only() {
        let mut m = RunMetrics::new();
        let error = AppError::Timeout(5);
        {
            let mut reporter = MetricsReporter::new(&mut m, Source::Indeed);
            reporter.report(RetryEvent::Failed { attempt: 1, error: &error });
            reporter.report(RetryEvent::Retrying {
                attempt: 1,
                delay: Duration::from_millis(500),
                error: &error,
            });
            reporter.report(RetryEvent::Failed { attempt: 2, error: &error });
            reporter.report(RetryEvent::Exhausted { attempts: 2, error: &error });
        }
        assert_eq!(m.retries_attempted, 1);
        assert_eq!(m.scraper_failures, 0);
    }
}
