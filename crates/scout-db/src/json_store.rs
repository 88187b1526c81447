use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use scout_core::config::RetentionConfig;
use scout_core::error::AppError;
use scout_core::models::{CanonicalJob, row_key};
use scout_core::scoring::ScoredJob;
use scout_core::summary::RunSummary;
use scout_core::traits::{PruneReport, RunStore};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::retention::plan_retention;

const INDEX_FILE: &str = "index.json";
const SUMMARY_FILE: &str = "summary.json";
const JOBS_FILE: &str = "jobs.jsonl";
const ENRICHED_FILE: &str = "enriched.jsonl";
const SCORES_FILE: &str = "scores.jsonl";

/// Rows stored in a JSONL file are keyed like SQLite rows.
trait Keyed {
    fn key(&self) -> String;
}

impl Keyed for CanonicalJob {
    fn key(&self) -> String {
        row_key(self.source, &self.url)
    }
}

impl Keyed for ScoredJob {
    fn key(&self) -> String {
        row_key(self.source, &self.url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnConflict {
    Ignore,
    Replace,
}

/// File-based [`RunStore`]: one directory per run under `base`, plus a
/// sorted `index.json` of run identifiers.
///
/// ```text
/// base/
///   index.json
///   20260314_091500/
///     summary.json
///     jobs.jsonl
///     enriched.jsonl
///     scores.jsonl
/// ```
#[derive(Debug, Clone)]
pub struct JsonRunStore {
    base: PathBuf,
}

impl JsonRunStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn run_dir(&self, run_ts: &str) -> PathBuf {
        self.base.join(run_ts)
    }

    async fn read_index(&self) -> Result<Vec<String>, AppError> {
        match tokio::fs::read_to_string(self.base.join(INDEX_FILE)).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_index(&self, mut runs: Vec<String>) -> Result<(), AppError> {
        runs.sort();
        runs.dedup();
        let raw = serde_json::to_string_pretty(&runs)?;
        tokio::fs::write(self.base.join(INDEX_FILE), raw).await?;
        Ok(())
    }

    /// Merges `rows` into `<run>/<file>` by row key. Returns how many rows
    /// were written.
    async fn merge_jsonl<T>(
        &self,
        run_ts: &str,
        file: &str,
        rows: &[T],
        on_conflict: OnConflict,
    ) -> Result<u64, AppError>
    where
        T: Keyed + Serialize + DeserializeOwned + Clone,
    {
        let dir = self.run_dir(run_ts);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(file);

        let mut merged: BTreeMap<String, T> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                for line in raw.lines().filter(|l| !l.trim().is_empty()) {
                    let row: T = serde_json::from_str(line)?;
                    let key = row.key();
                    if merged.insert(key.clone(), row).is_none() {
                        order.push(key);
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut written = 0;
        for row in rows {
            let key = row.key();
            match merged.get_mut(&key) {
                Some(existing) if on_conflict == OnConflict::Replace => {
                    *existing = row.clone();
                    written += 1;
                }
                Some(_) => {}
                None => {
                    merged.insert(key.clone(), row.clone());
                    order.push(key);
                    written += 1;
                }
            }
        }

        let mut out = String::new();
        for key in &order {
            if let Some(row) = merged.get(key) {
                out.push_str(&serde_json::to_string(row)?);
                out.push('\n');
            }
        }
        tokio::fs::write(&path, out).await?;
        Ok(written)
    }
}

impl RunStore for JsonRunStore {
    async fn init(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.base).await?;
        if !tokio::fs::try_exists(self.base.join(INDEX_FILE)).await? {
            self.write_index(Vec::new()).await?;
        }
        Ok(())
    }

    async fn insert_run(&self, summary: &RunSummary) -> Result<(), AppError> {
        let dir = self.run_dir(&summary.run_ts);
        tokio::fs::create_dir_all(&dir).await?;
        let raw = serde_json::to_string_pretty(summary)?;
        tokio::fs::write(dir.join(SUMMARY_FILE), raw).await?;

        let mut runs = self.read_index().await?;
        runs.push(summary.run_ts.clone());
        self.write_index(runs).await
    }

    async fn insert_jobs(&self, run_ts: &str, jobs: &[CanonicalJob]) -> Result<u64, AppError> {
        self.merge_jsonl(run_ts, JOBS_FILE, jobs, OnConflict::Ignore)
            .await
    }

    async fn insert_enriched(&self, run_ts: &str, jobs: &[CanonicalJob]) -> Result<u64, AppError> {
        self.merge_jsonl(run_ts, ENRICHED_FILE, jobs, OnConflict::Replace)
            .await
    }

    async fn insert_scores(&self, run_ts: &str, scores: &[ScoredJob]) -> Result<u64, AppError> {
        self.merge_jsonl(run_ts, SCORES_FILE, scores, OnConflict::Replace)
            .await
    }

    async fn list_runs(&self) -> Result<Vec<String>, AppError> {
        let mut runs = self.read_index().await?;
        runs.sort();
        runs.dedup();
        Ok(runs)
    }

    async fn prune(
        &self,
        retention: &RetentionConfig,
        now: DateTime<Utc>,
    ) -> Result<PruneReport, AppError> {
        let runs = self.list_runs().await?;
        let report = plan_retention(&runs, retention, now);
        if report.deleted_runs.is_empty() {
            return Ok(report);
        }

        for run_ts in &report.deleted_runs {
            match tokio::fs::remove_dir_all(self.run_dir(run_ts)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.write_index(report.kept_runs.clone()).await?;

        tracing::info!(
            deleted = report.deleted_runs.len(),
            kept = report.kept_runs.len(),
            "Pruned JSON runs"
        );
        Ok(report)
    }
}
