//! Run summary: what a run discovered, per-source status, and metrics.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::metrics::RunMetrics;
use crate::models::Source;

/// Format of run identifiers (`20260314_091500`).
pub const RUN_TS_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn format_run_ts(at: DateTime<Utc>) -> String {
    at.format(RUN_TS_FORMAT).to_string()
}

/// Parse a run identifier back into its UTC start time.
pub fn parse_run_ts(run_ts: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(run_ts, RUN_TS_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

/// How a source fared in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Fetched,
    Disabled,
    Misconfigured,
    Failed,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Fetched => "fetched",
            SourceStatus::Disabled => "disabled",
            SourceStatus::Misconfigured => "misconfigured",
            SourceStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub total_discovered: usize,
    pub filtered_out: usize,
    pub exported: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_ts: String,
    /// RFC 3339.
    pub timestamp_utc: String,
    pub enabled_sources: BTreeMap<Source, bool>,
    pub counts: RunCounts,
    pub per_source: RunMetrics,
    #[serde(default)]
    pub source_status: BTreeMap<Source, SourceStatus>,
}

impl RunSummary {
    pub fn new(
        started_at: DateTime<Utc>,
        config: &PipelineConfig,
        counts: RunCounts,
        metrics: RunMetrics,
        source_status: BTreeMap<Source, SourceStatus>,
    ) -> Self {
        let enabled_sources = Source::ALL
            .into_iter()
            .map(|s| (s, config.source_settings(s).enabled))
            .collect();

        Self {
            run_ts: format_run_ts(started_at),
            timestamp_utc: started_at.to_rfc3339(),
            enabled_sources,
            counts,
            per_source: metrics,
            source_status,
        }
    }

    /// Multi-line, human-readable rendering for the terminal.
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        let enabled: Vec<&str> = self
            .enabled_sources
            .iter()
            .filter(|(_, on)| **on)
            .map(|(s, _)| s.as_str())
            .collect();

        let _ = writeln!(out, "Summary @ {}", self.timestamp_utc);
        let _ = writeln!(
            out,
            "Discovered: {} | Filtered out: {} | Exported: {}",
            self.counts.total_discovered, self.counts.filtered_out, self.counts.exported
        );
        let _ = writeln!(
            out,
            "Sources enabled: {}",
            if enabled.is_empty() {
                "none".to_string()
            } else {
                enabled.join(", ")
            }
        );

        for (source, status) in &self.source_status {
            let fetched = self.per_source.jobs_fetched.get(source).copied().unwrap_or(0);
            let malformed = self
                .per_source
                .malformed_entries
                .get(source)
                .copied()
                .unwrap_or(0);
            match status {
                SourceStatus::Fetched => {
                    let _ = writeln!(out, "  {source}: {fetched} jobs ({malformed} malformed)");
                }
                other => {
                    let _ = writeln!(out, "  {source}: {}", other.as_str());
                }
            }
        }

        let _ = write!(
            out,
            "Retries attempted: {} | Rate-limit sleeps: {} | Scraper failures: {}",
            self.per_source.retries_attempted,
            self.per_source.rate_limit_sleeps,
            self.per_source.scraper_failures
        );
        out
    }
}
