use chrono::{DateTime, Utc};
use scout_core::config::{RetentionConfig, StorageBackend, StorageConfig};
use scout_core::error::AppError;
use scout_core::models::CanonicalJob;
use scout_core::scoring::ScoredJob;
use scout_core::summary::RunSummary;
use scout_core::traits::{PruneReport, RunStore};

use crate::json_store::JsonRunStore;
use crate::sqlite::SqliteRunStore;

/// The configured storage backend.
#[derive(Debug, Clone)]
pub enum Store {
    Sqlite(SqliteRunStore),
    Json(JsonRunStore),
}

impl Store {
    pub fn from_config(config: &StorageConfig) -> Self {
        match config.backend {
            StorageBackend::Sqlite => Store::Sqlite(SqliteRunStore::new(&config.sqlite_path)),
            StorageBackend::Json => Store::Json(JsonRunStore::new(&config.json_dir)),
        }
    }

    /// Backend name and location, for logs.
    pub fn describe(&self) -> String {
        match self {
            Store::Sqlite(s) => format!("sqlite:{}", s.path().display()),
            Store::Json(s) => format!("json:{}", s.base().display()),
        }
    }
}

impl RunStore for Store {
    async fn init(&self) -> Result<(), AppError> {
        match self {
            Store::Sqlite(s) => s.init().await,
            Store::Json(s) => s.init().await,
        }
    }

    async fn insert_run(&self, summary: &RunSummary) -> Result<(), AppError> {
        match self {
            Store::Sqlite(s) => s.insert_run(summary).await,
            Store::Json(s) => s.insert_run(summary).await,
        }
    }

    async fn insert_jobs(&self, run_ts: &str, jobs: &[CanonicalJob]) -> Result<u64, AppError> {
        match self {
            Store::Sqlite(s) => s.insert_jobs(run_ts, jobs).await,
            Store::Json(s) => s.insert_jobs(run_ts, jobs).await,
        }
    }

    async fn insert_enriched(&self, run_ts: &str, jobs: &[CanonicalJob]) -> Result<u64, AppError> {
        match self {
            Store::Sqlite(s) => s.insert_enriched(run_ts, jobs).await,
            Store::Json(s) => s.insert_enriched(run_ts, jobs).await,
        }
    }

    async fn insert_scores(&self, run_ts: &str, scores: &[ScoredJob]) -> Result<u64, AppError> {
        match self {
            Store::Sqlite(s) => s.insert_scores(run_ts, scores).await,
            Store::Json(s) => s.insert_scores(run_ts, scores).await,
        }
    }

    async fn list_runs(&self) -> Result<Vec<String>, AppError> {
        match self {
            Store::Sqlite(s) => s.list_runs().await,
            Store::Json(s) => s.list_runs().await,
        }
    }

    async fn prune(
        &self,
        retention: &RetentionConfig,
        now: DateTime<Utc>,
    ) -> Result<PruneReport, AppError> {
        match self {
            Store::Sqlite(s) => s.prune(retention, now).await,
            Store::Json(s) => s.prune(retention, now).await,
        }
    }
}
