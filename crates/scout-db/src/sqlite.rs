use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use scout_core::config::RetentionConfig;
use scout_core::error::AppError;
use scout_core::models::{CanonicalJob, row_key};
use scout_core::scoring::ScoredJob;
use scout_core::summary::RunSummary;
use scout_core::traits::{PruneReport, RunStore};
use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};

use crate::retention::plan_retention;

/// Schema statements, executed one at a time.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS runs (
        run_ts TEXT PRIMARY KEY,
        timestamp_utc TEXT NOT NULL,
        total_discovered INTEGER NOT NULL,
        filtered_out INTEGER NOT NULL,
        exported INTEGER NOT NULL,
        summary TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS jobs (
        run_ts TEXT NOT NULL REFERENCES runs(run_ts) ON DELETE CASCADE,
        row_key TEXT NOT NULL,
        job_id TEXT NOT NULL,
        title TEXT NOT NULL,
        company TEXT NOT NULL,
        location TEXT NOT NULL,
        url TEXT NOT NULL,
        source TEXT NOT NULL,
        posted_at TEXT NOT NULL,
        PRIMARY KEY (run_ts, row_key)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_jobs_job_id ON jobs(job_id)"#,
    r#"CREATE TABLE IF NOT EXISTS enriched (
        run_ts TEXT NOT NULL REFERENCES runs(run_ts) ON DELETE CASCADE,
        row_key TEXT NOT NULL,
        job_id TEXT NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (run_ts, row_key)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS scores (
        run_ts TEXT NOT NULL REFERENCES runs(run_ts) ON DELETE CASCADE,
        row_key TEXT NOT NULL,
        job_id TEXT NOT NULL,
        score REAL NOT NULL,
        bucket TEXT NOT NULL,
        PRIMARY KEY (run_ts, row_key)
    )"#,
];

fn db_err(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(e.to_string())
}

/// SQLite-backed [`RunStore`].
///
/// Opens a fresh connection for every operation and closes it afterwards,
/// so the store can be shared freely and never holds the file open between
/// runs.
#[derive(Debug, Clone)]
pub struct SqliteRunStore {
    path: PathBuf,
}

impl SqliteRunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection, AppError> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .foreign_keys(true);

        SqliteConnection::connect_with(&options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to open {}: {e}", self.path.display()))
        })
    }
}

impl RunStore for SqliteRunStore {
    async fn init(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut conn = self.connect().await?;
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut conn)
                .await
                .map_err(db_err)?;
        }
        conn.close().await.map_err(db_err)?;

        tracing::debug!(path = %self.path.display(), "SQLite schema ready");
        Ok(())
    }

    async fn insert_run(&self, summary: &RunSummary) -> Result<(), AppError> {
        let payload = serde_json::to_string(summary)?;
        let mut conn = self.connect().await?;
        sqlx::query(
            r#"
            INSERT INTO runs (run_ts, timestamp_utc, total_discovered, filtered_out, exported, summary)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(run_ts) DO UPDATE SET
                timestamp_utc = excluded.timestamp_utc,
                total_discovered = excluded.total_discovered,
                filtered_out = excluded.filtered_out,
                exported = excluded.exported,
                summary = excluded.summary
            "#,
        )
        .bind(&summary.run_ts)
        .bind(&summary.timestamp_utc)
        .bind(summary.counts.total_discovered as i64)
        .bind(summary.counts.filtered_out as i64)
        .bind(summary.counts.exported as i64)
        .bind(payload)
        .execute(&mut conn)
        .await
        .map_err(db_err)?;
        conn.close().await.map_err(db_err)?;
        Ok(())
    }

    async fn insert_jobs(&self, run_ts: &str, jobs: &[CanonicalJob]) -> Result<u64, AppError> {
        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await.map_err(db_err)?;
        let mut written = 0;
        for job in jobs {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO jobs
                    (run_ts, row_key, job_id, title, company, location, url, source, posted_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(run_ts)
            .bind(row_key(job.source, &job.url))
            .bind(&job.job_id)
            .bind(&job.title)
            .bind(&job.company)
            .bind(&job.location)
            .bind(&job.url)
            .bind(job.source.as_str())
            .bind(&job.posted_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            written += result.rows_affected();
        }
        tx.commit().await.map_err(db_err)?;
        conn.close().await.map_err(db_err)?;
        Ok(written)
    }

    async fn insert_enriched(&self, run_ts: &str, jobs: &[CanonicalJob]) -> Result<u64, AppError> {
        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await.map_err(db_err)?;
        let mut written = 0;
        for job in jobs {
            let payload = serde_json::to_string(job)?;
            let result = sqlx::query(
                r#"
                INSERT OR REPLACE INTO enriched (run_ts, row_key, job_id, payload)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(run_ts)
            .bind(row_key(job.source, &job.url))
            .bind(&job.job_id)
            .bind(payload)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            written += result.rows_affected().min(1);
        }
        tx.commit().await.map_err(db_err)?;
        conn.close().await.map_err(db_err)?;
        Ok(written)
    }

    async fn insert_scores(&self, run_ts: &str, scores: &[ScoredJob]) -> Result<u64, AppError> {
        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await.map_err(db_err)?;
        let mut written = 0;
        for scored in scores {
            let result = sqlx::query(
                r#"
                INSERT OR REPLACE INTO scores (run_ts, row_key, job_id, score, bucket)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(run_ts)
            .bind(row_key(scored.source, &scored.url))
            .bind(&scored.job_id)
            .bind(scored.score)
            .bind(scored.bucket.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            written += result.rows_affected().min(1);
        }
        tx.commit().await.map_err(db_err)?;
        conn.close().await.map_err(db_err)?;
        Ok(written)
    }

    async fn list_runs(&self) -> Result<Vec<String>, AppError> {
        let mut conn = self.connect().await?;
        let runs = sqlx::query_scalar::<_, String>("SELECT run_ts FROM runs ORDER BY run_ts ASC")
            .fetch_all(&mut conn)
            .await
            .map_err(db_err)?;
        conn.close().await.map_err(db_err)?;
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

        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await.map_err(db_err)?;
        for run_ts in &report.deleted_runs {
            sqlx::query("DELETE FROM runs WHERE run_ts = ?")
                .bind(run_ts)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        conn.close().await.map_err(db_err)?;

        tracing::info!(
            deleted = report.deleted_runs.len(),
            kept = report.kept_runs.len(),
            "Pruned SQLite runs"
        );
        Ok(report)
    }
}
