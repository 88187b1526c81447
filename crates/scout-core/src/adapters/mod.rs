//! Source adapters: translate one board's raw feed into canonical jobs.
//!
//! Each board only describes how its records map onto canonical fields
//! ([`SourceAdapter::map_fields`]). Gating, rate limiting, retries,
//! validation, identity, and ordering are shared by [`fetch_source_jobs`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::config::SourceSettings;
use crate::context::ScrapeContext;
use crate::error::AppError;
use crate::metrics::{MetricsReporter, RunMetrics};
use crate::models::{CanonicalJob, Source, derive_job_id};
use crate::retry::with_retry;
use crate::summary::SourceStatus;
use crate::throttle::{Clock, Sleeper};
use crate::traits::{FeedFetcher, FeedRequest};
use crate::util::normalize_posted_date;

pub mod ashby;
pub mod craigslist;
pub mod googlejobs;
pub mod goremote;
pub mod greenhouse;
pub mod indeed;
pub mod lever;
pub mod linkedin;

pub use ashby::AshbyAdapter;
pub use craigslist::CraigslistAdapter;
pub use googlejobs::GoogleJobsAdapter;
pub use goremote::GoRemoteAdapter;
pub use greenhouse::GreenhouseAdapter;
pub use indeed::IndeedAdapter;
pub use lever::LeverAdapter;
pub use linkedin::LinkedInAdapter;

/// Canonical fields pulled out of one raw record, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub posted: String,
}

impl RawFields {
    fn into_job(self, source: Source, today: NaiveDate) -> CanonicalJob {
        CanonicalJob {
            job_id: derive_job_id(&self.title, &self.company, &self.url),
            posted_at: normalize_posted_date(&self.posted, today),
            title: self.title,
            company: self.company,
            location: self.location,
            url: self.url,
            source,
            enrichment: None,
        }
    }
}

/// One job board.
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// Whether the board refuses requests without an API key.
    fn requires_api_key(&self) -> bool {
        false
    }

    /// Pull canonical fields out of a raw record. Missing fields are empty.
    fn map_fields(&self, record: &Map<String, Value>) -> RawFields;
}

/// Why a source did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    Misconfigured { missing: Vec<&'static str> },
}

/// What one adapter invocation produced.
#[derive(Debug)]
pub enum SourceOutcome {
    /// Canonical jobs, deduplicated and sorted by `job_id`.
    Fetched(Vec<CanonicalJob>),
    Skipped(SkipReason),
    Failed { attempts: u32, reason: String },
}

impl SourceOutcome {
    pub fn status(&self) -> SourceStatus {
        match self {
            SourceOutcome::Fetched(_) => SourceStatus::Fetched,
            SourceOutcome::Skipped(SkipReason::Disabled) => SourceStatus::Disabled,
            SourceOutcome::Skipped(SkipReason::Misconfigured { .. }) => SourceStatus::Misconfigured,
            SourceOutcome::Failed { .. } => SourceStatus::Failed,
        }
    }

    pub fn into_jobs(self) -> Vec<CanonicalJob> {
        match self {
            SourceOutcome::Fetched(jobs) => jobs,
            _ => Vec::new(),
        }
    }
}

/// Decide whether `adapter` may run with `settings`, and build its request.
pub fn check_gate(
    adapter: &dyn SourceAdapter,
    settings: &SourceSettings,
) -> Result<FeedRequest, SkipReason> {
    if !settings.enabled {
        return Err(SkipReason::Disabled);
    }

    let url = settings
        .api_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());
    let api_key = settings
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let mut missing = Vec::new();
    if url.is_none() {
        missing.push("API_URL");
    }
    if adapter.requires_api_key() && api_key.is_none() {
        missing.push("API_KEY");
    }

    match url {
        Some(url) if missing.is_empty() => Ok(FeedRequest {
            source: adapter.source(),
            url: url.to_string(),
            api_key: api_key.map(String::from),
        }),
        _ => Err(SkipReason::Misconfigured { missing }),
    }
}

/// Gate, fetch (rate-limited, retried), and normalize one source.
///
/// Never fails: a misconfigured or unreachable source yields an empty
/// outcome and the run goes on.
pub async fn fetch_source_jobs<F, C, S>(
    adapter: &dyn SourceAdapter,
    settings: &SourceSettings,
    fetcher: &F,
    ctx: &mut ScrapeContext<C, S>,
) -> SourceOutcome
where
    F: FeedFetcher,
    C: Clock,
    S: Sleeper,
{
    let source = adapter.source();
    let request = match check_gate(adapter, settings) {
        Ok(request) => request,
        Err(SkipReason::Disabled) => {
            tracing::debug!(%source, "Source disabled, skipping");
            return SourceOutcome::Skipped(SkipReason::Disabled);
        }
        Err(SkipReason::Misconfigured { missing }) => {
            let prefix = source.env_prefix();
            let vars: Vec<String> = missing.iter().map(|m| format!("{prefix}_{m}")).collect();
            tracing::warn!(
                %source,
                missing = %vars.join(", "),
                "Source enabled but misconfigured, skipping"
            );
            return SourceOutcome::Skipped(SkipReason::Misconfigured { missing });
        }
    };

    tracing::info!(%source, url = %request.url, "Fetching source");

    let limiter = &ctx.limiter;
    let request = &request;
    let mut reporter = MetricsReporter::new(&mut ctx.metrics, source);
    let result = with_retry(&ctx.retry, limiter.sleeper(), &mut reporter, move || async move {
        limiter.acquire().await;
        match fetcher.fetch_feed(request).await? {
            Value::Array(items) => Ok(items),
            other => Err(AppError::MalformedResponse(format!(
                "{source} feed returned {} instead of an array",
                json_kind(&other)
            ))),
        }
    })
    .await;
    ctx.metrics.rate_limit_sleeps += limiter.take_sleeps();

    match result {
        Ok(items) => {
            let jobs = normalize_records(adapter, &items, ctx.today, &mut ctx.metrics);
            ctx.metrics.inc_jobs(source, jobs.len() as u64);
            tracing::info!(%source, raw = items.len(), jobs = jobs.len(), "Source fetched");
            SourceOutcome::Fetched(jobs)
        }
        Err(exhausted) => {
            ctx.metrics.scraper_failures += 1;
            SourceOutcome::Failed {
                attempts: exhausted.attempts,
                reason: exhausted.last_error.to_string(),
            }
        }
    }
}

/// Turn raw records into canonical jobs.
///
/// Non-objects and records without a title or URL are dropped and counted
/// as malformed. Duplicate IDs keep the first occurrence. Output is sorted
/// by `job_id`.
pub fn normalize_records(
    adapter: &dyn SourceAdapter,
    items: &[Value],
    today: NaiveDate,
    metrics: &mut RunMetrics,
) -> Vec<CanonicalJob> {
    let source = adapter.source();
    let mut by_id: BTreeMap<String, CanonicalJob> = BTreeMap::new();
    let mut malformed = 0u64;

    for (index, item) in items.iter().enumerate() {
        let Some(record) = item.as_object() else {
            malformed += 1;
            tracing::debug!(%source, index, kind = json_kind(item), "Dropping non-object record");
            continue;
        };

        let fields = adapter.map_fields(record);
        if fields.title.is_empty() || fields.url.is_empty() {
            malformed += 1;
            tracing::debug!(%source, index, "Dropping record without title or url");
            continue;
        }

        let job = fields.into_job(source, today);
        by_id.entry(job.job_id.clone()).or_insert(job);
    }

    if malformed > 0 {
        metrics.inc_malformed(source, malformed);
    }
    by_id.into_values().collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
