//! Multi-source discovery: run every enabled adapter, merge, deduplicate,
//! and optionally enrich.

use std::collections::BTreeMap;

use crate::adapters::{
    AshbyAdapter, CraigslistAdapter, GoRemoteAdapter, GoogleJobsAdapter, GreenhouseAdapter,
    IndeedAdapter, LeverAdapter, LinkedInAdapter, SourceAdapter, fetch_source_jobs,
};
use crate::config::PipelineConfig;
use crate::context::ScrapeContext;
use crate::error::AppError;
use crate::models::{CanonicalJob, Source};
use crate::summary::SourceStatus;
use crate::throttle::{Clock, Sleeper};
use crate::traits::{Enricher, FeedFetcher};

/// Ordered set of adapters. Order decides which duplicate wins in a merge.
pub struct SourceRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// All built-in adapters: lever, greenhouse, ashby, indeed, linkedin,
    /// craigslist, goremote, googlejobs.
    pub fn builtin() -> Self {
        Self::empty()
            .register(LeverAdapter)
            .register(GreenhouseAdapter)
            .register(AshbyAdapter)
            .register(IndeedAdapter)
            .register(LinkedInAdapter)
            .register(CraigslistAdapter)
            .register(GoRemoteAdapter)
            .register(GoogleJobsAdapter)
    }

    /// Add an adapter, replacing any existing one for the same source.
    pub fn register(mut self, adapter: impl SourceAdapter + 'static) -> Self {
        let source = adapter.source();
        match self.adapters.iter().position(|a| a.source() == source) {
            Some(i) => self.adapters[i] = Box::new(adapter),
            None => self.adapters.push(Box::new(adapter)),
        }
        self
    }

    /// Move the listed sources to the front, in the given order. Unlisted
    /// sources keep their relative order after them.
    pub fn with_priority(mut self, priority: &[Source]) -> Self {
        if !priority.is_empty() {
            self.adapters.sort_by_key(|a| {
                priority
                    .iter()
                    .position(|p| *p == a.source())
                    .unwrap_or(priority.len())
            });
        }
        self
    }

    pub fn sources(&self) -> Vec<Source> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SourceAdapter> {
        self.adapters.iter().map(|a| a.as_ref())
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Result of one discovery run.
#[derive(Debug)]
pub struct DiscoveryReport {
    /// Merged jobs, unique by `job_id`, sorted ascending by `job_id`.
    pub jobs: Vec<CanonicalJob>,
    pub source_status: BTreeMap<Source, SourceStatus>,
    pub enrichment_applied: bool,
}

/// Runs the registry against a feed fetcher.
pub struct Orchestrator<F> {
    registry: SourceRegistry,
    fetcher: F,
    enricher: Option<Box<dyn Enricher>>,
}

impl<F: FeedFetcher> Orchestrator<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            registry: SourceRegistry::builtin(),
            fetcher,
            enricher: None,
        }
    }

    pub fn with_registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_enricher(mut self, enricher: impl Enricher + 'static) -> Self {
        self.enricher = Some(Box::new(enricher));
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Discover, merge, and (if configured) enrich jobs from all enabled sources.
    ///
    /// Adapters run one after another in registry order. A failing source
    /// contributes nothing; it never aborts the run. Metrics in `ctx` are
    /// reset first.
    pub async fn run<C: Clock, S: Sleeper>(
        &self,
        config: &PipelineConfig,
        ctx: &mut ScrapeContext<C, S>,
    ) -> DiscoveryReport {
        ctx.begin_run();

        let mut merged: BTreeMap<String, CanonicalJob> = BTreeMap::new();
        let mut source_status = BTreeMap::new();

        for adapter in self.registry.iter() {
            let source = adapter.source();
            let settings = config.source_settings(source);
            let outcome = fetch_source_jobs(adapter, &settings, &self.fetcher, ctx).await;
            source_status.insert(source, outcome.status());

            for job in outcome.into_jobs() {
                merged.entry(job.job_id.clone()).or_insert(job);
            }
        }

        let mut jobs: Vec<CanonicalJob> = merged.into_values().collect();
        tracing::info!(
            jobs = jobs.len(),
            sources = source_status.len(),
            "Discovery merged"
        );

        let mut enrichment_applied = false;
        if let Some(enricher) = &self.enricher {
            match enrich_all(enricher.as_ref(), &jobs) {
                Ok(enriched) => {
                    jobs = enriched;
                    enrichment_applied = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Enrichment failed, keeping canonical jobs");
                }
            }
        }

        DiscoveryReport {
            jobs,
            source_status,
            enrichment_applied,
        }
    }

    /// Just the merged jobs.
    pub async fn fetch_all_sources<C: Clock, S: Sleeper>(
        &self,
        config: &PipelineConfig,
        ctx: &mut ScrapeContext<C, S>,
    ) -> Vec<CanonicalJob> {
        self.run(config, ctx).await.jobs
    }
}

fn enrich_all(enricher: &dyn Enricher, jobs: &[CanonicalJob]) -> Result<Vec<CanonicalJob>, AppError> {
    jobs.iter()
        .map(|job| enricher.enrich(job).map(|e| job.with_enrichment(e)))
        .collect()
}
