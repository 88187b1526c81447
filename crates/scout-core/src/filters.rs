//! Include/exclude keyword filters.

use crate::config::FilterConfig;
use crate::models::CanonicalJob;
use crate::util::normalize_terms;

/// Case-insensitive match. Terms must already be lowercased.
///
/// Any exclude term in the title rejects the job. Otherwise, when keywords
/// are set, one must appear in the title; when locations are set, one must
/// appear in the location or the title ("Remote" often only shows up there).
pub fn matches_filters(
    title: &str,
    location: &str,
    keywords: &[String],
    locations: &[String],
    exclude: &[String],
) -> bool {
    let title = title.to_lowercase();
    let location = location.to_lowercase();

    if exclude.iter().any(|term| title.contains(term.as_str())) {
        return false;
    }
    if !keywords.is_empty() && !keywords.iter().any(|k| title.contains(k.as_str())) {
        return false;
    }
    if !locations.is_empty()
        && !locations
            .iter()
            .any(|l| location.contains(l.as_str()) || title.contains(l.as_str()))
    {
        return false;
    }
    true
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    keywords: Vec<String>,
    locations: Vec<String>,
    exclude: Vec<String>,
}

impl JobFilter {
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            keywords: normalize_terms(&config.keywords),
            locations: normalize_terms(&config.locations),
            exclude: normalize_terms(&config.exclude_keywords),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.locations.is_empty() && self.exclude.is_empty()
    }

    pub fn matches(&self, job: &CanonicalJob) -> bool {
        matches_filters(
            &job.title,
            &job.location,
            &self.keywords,
            &self.locations,
            &self.exclude,
        )
    }

    /// Keeps matching jobs in order. Returns them with the number dropped.
    pub fn apply(&self, jobs: Vec<CanonicalJob>) -> (Vec<CanonicalJob>, usize) {
        let before = jobs.len();
        let kept: Vec<CanonicalJob> = jobs.into_iter().filter(|job| self.matches(job)).collect();
        let dropped = before - kept.len();
        (kept, dropped)
    }
}
