pub mod adapters;
pub mod config;
pub mod context;
pub mod enrich;
pub mod error;
pub mod filters;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod retry;
pub mod schedule;
pub mod scoring;
pub mod summary;
pub mod throttle;
pub mod traits;
pub mod util;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::PipelineConfig;
pub use context::ScrapeContext;
pub use error::AppError;
pub use metrics::{MetricsSnapshot, RunMetrics};
pub use models::{CanonicalJob, Enrichment, Source, compute_hash, derive_job_id};
pub use orchestrator::{DiscoveryReport, Orchestrator, SourceRegistry};
pub use scoring::{ScoreBucket, ScoredJob};
pub use summary::RunSummary;
pub use traits::{Enricher, FeedFetcher, FeedRequest, RunStore};
