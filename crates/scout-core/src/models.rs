use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A job board scout knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Lever,
    Greenhouse,
    Ashby,
    Indeed,
    LinkedIn,
    Craigslist,
    GoRemote,
    GoogleJobs,
}

impl Source {
    /// Every known source, in default registry order.
    pub const ALL: [Source; 8] = [
        Source::Lever,
        Source::Greenhouse,
        Source::Ashby,
        Source::Indeed,
        Source::LinkedIn,
        Source::Craigslist,
        Source::GoRemote,
        Source::GoogleJobs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Lever => "lever",
            Source::Greenhouse => "greenhouse",
            Source::Ashby => "ashby",
            Source::Indeed => "indeed",
            Source::LinkedIn => "linkedin",
            Source::Craigslist => "craigslist",
            Source::GoRemote => "goremote",
            Source::GoogleJobs => "googlejobs",
        }
    }

    /// Prefix of the environment variables configuring this source
    /// (e.g. `LEVER` for `LEVER_ENABLED`, `LEVER_API_URL`).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Source::Lever => "LEVER",
            Source::Greenhouse => "GREENHOUSE",
            Source::Ashby => "ASHBY",
            Source::Indeed => "INDEED",
            Source::LinkedIn => "LINKEDIN",
            Source::Craigslist => "CRAIGSLIST",
            Source::GoRemote => "GOREMOTE",
            Source::GoogleJobs => "GOOGLEJOBS",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lever" => Ok(Source::Lever),
            "greenhouse" => Ok(Source::Greenhouse),
            "ashby" => Ok(Source::Ashby),
            "indeed" => Ok(Source::Indeed),
            "linkedin" => Ok(Source::LinkedIn),
            "craigslist" => Ok(Source::Craigslist),
            "goremote" | "go_remote" => Ok(Source::GoRemote),
            "googlejobs" | "google_jobs" => Ok(Source::GoogleJobs),
            _ => Err(format!("Unknown source: {}", s)),
        }
    }
}

/// Inferred attributes attached to a job by an [`Enricher`](crate::traits::Enricher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub normalized_title: String,
    pub seniority: String,
    pub domain_tags: Vec<String>,
    pub stack: Vec<String>,
    pub skills: Vec<String>,
    pub role_tags: Vec<String>,
    pub stack_tags: Vec<String>,
    pub remote_friendly: bool,
}

/// A normalized, source-agnostic job posting.
///
/// Enrichment fields are flattened into the record when present, so an
/// enriched job serializes as a single flat object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalJob {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: Source,
    /// `YYYY-MM-DD`
    pub posted_at: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

impl CanonicalJob {
    /// Returns a copy of this job carrying the given enrichment.
    pub fn with_enrichment(&self, enrichment: Enrichment) -> Self {
        Self {
            enrichment: Some(enrichment),
            ..self.clone()
        }
    }
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Derive the cross-source identity of a posting.
///
/// First 16 hex chars of SHA-256 over `title|company|url`, each trimmed
/// and lowercased. Two adapters that see the same posting agree on its ID.
pub fn derive_job_id(title: &str, company: &str, url: &str) -> String {
    let key = format!(
        "{}|{}|{}",
        title.trim().to_lowercase(),
        company.trim().to_lowercase(),
        url.trim().to_lowercase()
    );
    let mut digest = compute_hash(&key);
    digest.truncate(16);
    digest
}

/// Storage row key for a job-scoped record: SHA-256 hex of `source|url`.
pub fn row_key(source: Source, url: &str) -> String {
    compute_hash(&format!("{}|{}", source.as_str(), url))
}
