use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RetentionConfig;
use crate::error::AppError;
use crate::models::{CanonicalJob, Enrichment, Source};
use crate::scoring::ScoredJob;
use crate::summary::{RunSummary, parse_run_ts};

/// One feed request issued by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub source: Source,
    pub url: String,
    pub api_key: Option<String>,
}

/// Fetches a source's raw JSON feed.
pub trait FeedFetcher: Send + Sync {
    fn fetch_feed(
        &self,
        request: &FeedRequest,
    ) -> impl Future<Output = Result<serde_json::Value, AppError>> + Send;
}

/// Infers extra attributes for a canonical job.
pub trait Enricher: Send + Sync {
    fn enrich(&self, job: &CanonicalJob) -> Result<Enrichment, AppError>;
}

/// Result of a retention pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    pub deleted_runs: Vec<String>,
    pub kept_runs: Vec<String>,
}

/// Persists run artifacts and applies retention.
pub trait RunStore: Send + Sync {
    /// Create tables or directories. Idempotent.
    fn init(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    fn insert_run(&self, summary: &RunSummary) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Returns the number of rows written.
    fn insert_jobs(
        &self,
        run_ts: &str,
        jobs: &[CanonicalJob],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    fn insert_enriched(
        &self,
        run_ts: &str,
        jobs: &[CanonicalJob],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    fn insert_scores(
        &self,
        run_ts: &str,
        scores: &[ScoredJob],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Persisted run identifiers, oldest first.
    fn list_runs(&self) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    fn prune(
        &self,
        retention: &RetentionConfig,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<PruneReport, AppError>> + Send;

    /// Start time of the newest persisted run.
    fn last_run_at(&self) -> impl Future<Output = Result<Option<DateTime<Utc>>, AppError>> + Send {
        async move {
            let runs = self.list_runs().await?;
            Ok(runs.iter().filter_map(|ts| parse_run_ts(ts)).max())
        }
    }
}
