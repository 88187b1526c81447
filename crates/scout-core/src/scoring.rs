//! Weighted scoring of enriched jobs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ScoringConfig, Thresholds};
use crate::models::{CanonicalJob, Enrichment, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScoreBucket {
    Exceptional,
    Strong,
    Moderate,
    Weak,
}

impl ScoreBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBucket::Exceptional => "Exceptional",
            ScoreBucket::Strong => "Strong",
            ScoreBucket::Moderate => "Moderate",
            ScoreBucket::Weak => "Weak",
        }
    }
}

impl fmt::Display for ScoreBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredJob {
    pub job_id: String,
    pub source: Source,
    pub url: String,
    pub title: String,
    pub score: f64,
    pub bucket: ScoreBucket,
}

pub fn bucket_score(score: f64, thresholds: &Thresholds) -> ScoreBucket {
    if score >= thresholds.exceptional {
        ScoreBucket::Exceptional
    } else if score >= thresholds.strong {
        ScoreBucket::Strong
    } else if score >= thresholds.moderate {
        ScoreBucket::Moderate
    } else {
        ScoreBucket::Weak
    }
}

/// 1.0 when the feature is present on the enrichment, 0.0 otherwise.
/// Unknown feature names contribute nothing.
fn feature_value(enrichment: &Enrichment, feature: &str) -> f64 {
    let present = match feature {
        "role_fit" | "role" => !enrichment.role_tags.is_empty(),
        "stack" => !enrichment.stack_tags.is_empty(),
        "remote" => enrichment.remote_friendly,
        "domain" => !enrichment.domain_tags.is_empty(),
        "skills" => !enrichment.skills.is_empty(),
        _ => false,
    };
    if present { 1.0 } else { 0.0 }
}

/// Weighted sum normalized by the total absolute weight, clamped to `[0, 1]`.
/// Jobs without enrichment score zero.
pub fn score_job(job: &CanonicalJob, config: &ScoringConfig) -> ScoredJob {
    let total: f64 = config.weights.values().map(|w| w.abs()).sum();
    let score = match &job.enrichment {
        Some(enrichment) if total > 0.0 => {
            let raw: f64 = config
                .weights
                .iter()
                .map(|(feature, weight)| weight * feature_value(enrichment, feature))
                .sum();
            (raw / total).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };

    ScoredJob {
        job_id: job.job_id.clone(),
        source: job.source,
        url: job.url.clone(),
        title: job.title.clone(),
        score,
        bucket: bucket_score(score, &config.thresholds),
    }
}

/// Scores in input order.
pub fn score_jobs(jobs: &[CanonicalJob], config: &ScoringConfig) -> Vec<ScoredJob> {
    jobs.iter().map(|job| score_job(job, config)).collect()
}
