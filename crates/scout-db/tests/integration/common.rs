use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use scout_core::config::PipelineConfig;
use scout_core::metrics::RunMetrics;
use scout_core::models::{CanonicalJob, Enrichment, Source, derive_job_id};
use scout_core::scoring::{ScoreBucket, ScoredJob};
use scout_core::summary::{RunCounts, RunSummary};
use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use tempfile::TempDir;

/// Fresh temporary directory. Keep the `TempDir` alive for the test.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

pub fn started_at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 9, 15, 0).unwrap()
}

pub fn summary(day: u32) -> RunSummary {
    let counts = RunCounts {
        total_discovered: 2,
        filtered_out: 0,
        exported: 2,
    };
    RunSummary::new(
        started_at(day),
        &PipelineConfig::default(),
        counts,
        RunMetrics::default(),
        BTreeMap::new(),
    )
}

pub fn job(title: &str, company: &str, url: &str, source: Source) -> CanonicalJob {
    CanonicalJob {
        job_id: derive_job_id(title, company, url),
        title: title.into(),
        company: company.into(),
        location: "Remote".into(),
        url: url.into(),
        source,
        posted_at: "2026-03-01".into(),
        enrichment: None,
    }
}

pub fn sample_jobs() -> Vec<CanonicalJob> {
    vec![
        job("Software Engineer", "Acme", "https://x/1", Source::Lever),
        job("Data Engineer", "Globex", "https://x/2", Source::Greenhouse),
    ]
}

pub fn enriched(job: &CanonicalJob, seniority: &str) -> CanonicalJob {
    job.with_enrichment(Enrichment {
        normalized_title: job.title.to_lowercase(),
        seniority: seniority.into(),
        domain_tags: vec![],
        stack: vec![],
        skills: vec![],
        role_tags: vec!["engineer".into()],
        stack_tags: vec![],
        remote_friendly: true,
    })
}

pub fn scored(job: &CanonicalJob, score: f64, bucket: ScoreBucket) -> ScoredJob {
    ScoredJob {
        job_id: job.job_id.clone(),
        source: job.source,
        url: job.url.clone(),
        title: job.title.clone(),
        score,
        bucket,
    }
}

/// Counts rows in `table`, optionally restricted to one run.
pub async fn count_rows(db: &Path, table: &str, run_ts: Option<&str>) -> i64 {
    let options = SqliteConnectOptions::new().filename(db);
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .expect("Failed to open test database");

    let count = match run_ts {
        Some(run_ts) => {
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table} WHERE run_ts = ?"))
                .bind(run_ts)
                .fetch_one(&mut conn)
                .await
        }
        None => {
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&mut conn)
                .await
        }
    }
    .expect("Failed to count rows");

    conn.close().await.expect("Failed to close connection");
    count
}
