//! Run artifacts written to the output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use scout_core::models::CanonicalJob;
use scout_core::scoring::ScoredJob;
use scout_core::summary::RunSummary;

pub const JOBS_HEADER: [&str; 7] = [
    "job_id",
    "title",
    "company",
    "location",
    "url",
    "source",
    "posted_at",
];

pub const SCORES_HEADER: [&str; 6] = ["job_id", "title", "source", "url", "score", "bucket"];

pub fn jobs_csv_path(out_dir: &Path, run_ts: &str) -> PathBuf {
    out_dir.join(format!("jobs_discovered_{run_ts}.csv"))
}

pub fn summary_path(out_dir: &Path, run_ts: &str) -> PathBuf {
    out_dir.join(format!("jobs_discovered_{run_ts}.summary.json"))
}

pub fn enriched_path(out_dir: &Path, run_ts: &str) -> PathBuf {
    out_dir.join(format!("jobs_enriched_{run_ts}.json"))
}

pub fn scores_csv_path(out_dir: &Path, run_ts: &str) -> PathBuf {
    out_dir.join(format!("jobs_scored_{run_ts}.csv"))
}

/// Canonical columns only, header always present.
pub fn write_jobs_csv(out_dir: &Path, run_ts: &str, jobs: &[CanonicalJob]) -> Result<PathBuf> {
    let path = jobs_csv_path(out_dir, run_ts);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(JOBS_HEADER)?;
    for job in jobs {
        writer.write_record([
            job.job_id.as_str(),
            job.title.as_str(),
            job.company.as_str(),
            job.location.as_str(),
            job.url.as_str(),
            job.source.as_str(),
            job.posted_at.as_str(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn write_scores_csv(out_dir: &Path, run_ts: &str, scores: &[ScoredJob]) -> Result<PathBuf> {
    let path = scores_csv_path(out_dir, run_ts);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(SCORES_HEADER)?;
    for scored in scores {
        let score = format!("{:.3}", scored.score);
        writer.write_record([
            scored.job_id.as_str(),
            scored.title.as_str(),
            scored.source.as_str(),
            scored.url.as_str(),
            score.as_str(),
            scored.bucket.as_str(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn write_enriched_json(out_dir: &Path, run_ts: &str, jobs: &[CanonicalJob]) -> Result<PathBuf> {
    let path = enriched_path(out_dir, run_ts);
    let raw = serde_json::to_string_pretty(jobs)?;
    std::fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn write_summary(out_dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    let path = summary_path(out_dir, &summary.run_ts);
    let raw = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
