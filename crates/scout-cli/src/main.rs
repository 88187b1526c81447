mod export;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use scout_client::{FixtureFetcher, ReqwestFeedFetcher};
use scout_core::enrich::KeywordEnricher;
use scout_core::filters::JobFilter;
use scout_core::schedule::{compute_next_run, should_run};
use scout_core::scoring::score_jobs;
use scout_core::summary::{RunCounts, RunSummary};
use scout_core::traits::{FeedFetcher, RunStore};
use scout_core::{Orchestrator, PipelineConfig, ScrapeContext, SourceRegistry};
use scout_db::Store;

#[derive(Parser)]
#[command(name = "scout", version, about = "Multi-source job discovery pipeline")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "SCOUT_CONFIG",
        default_value = "config/scout.json"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, merge, filter, and export jobs from all enabled sources
    Discover {
        /// Output directory (defaults to system.output_directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Only write the run summary, no CSV/JSON job artifacts
        #[arg(long, default_value_t = false)]
        summary_only: bool,

        /// Enrich and score jobs regardless of enrichment.enabled
        #[arg(long, default_value_t = false)]
        enrich: bool,

        /// Skip the run unless the schedule says it is due
        #[arg(long, default_value_t = false)]
        schedule: bool,

        /// Serve feeds from <DIR>/<source>.json instead of the network
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Apply the retention policy to stored runs
    Prune,

    /// Print when the next scheduled run is due
    NextRun,

    /// Check the configuration and list problems
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = PipelineConfig::load(&cli.config)
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let directive: Directive = format!("scout={}", config.system.log_level)
        .parse()
        .or_else(|_| "scout=info".parse())?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Discover {
            out_dir,
            summary_only,
            enrich,
            schedule,
            fixtures,
        } => {
            let opts = DiscoverOptions {
                out_dir: out_dir.unwrap_or_else(|| config.system.output_directory.clone()),
                summary_only,
                enrich,
                schedule,
            };
            match fixtures {
                Some(dir) => {
                    let fetcher = FixtureFetcher::from_dir(&dir)
                        .map_err(|e| anyhow::anyhow!(e))
                        .with_context(|| format!("Failed to load fixtures from {}", dir.display()))?;
                    tracing::info!(dir = %dir.display(), sources = ?fetcher.sources(), "Serving feeds from fixtures");
                    cmd_discover(config, opts, fetcher).await?;
                }
                None => {
                    let timeout = Duration::from_secs(config.scraper.timeout_secs.max(1));
                    let fetcher = ReqwestFeedFetcher::with_timeout(timeout)
                        .context("Failed to create HTTP client")?;
                    cmd_discover(config, opts, fetcher).await?;
                }
            }
        }
        Commands::Prune => cmd_prune(&config).await?,
        Commands::NextRun => {
            let next = compute_next_run(Utc::now(), &config.scheduling);
            println!("{}", next.to_rfc3339());
        }
        Commands::Validate => cmd_validate(&config),
    }

    Ok(())
}

struct DiscoverOptions {
    out_dir: PathBuf,
    summary_only: bool,
    enrich: bool,
    schedule: bool,
}

async fn cmd_discover<F: FeedFetcher>(
    mut config: PipelineConfig,
    opts: DiscoverOptions,
    fetcher: F,
) -> Result<()> {
    for problem in config.validate() {
        tracing::warn!("Config: {problem}");
    }
    if opts.enrich {
        config.enrichment.enabled = true;
    }

    let started_at = Utc::now();
    let store = Store::from_config(&config.storage);
    let store_ready = match store.init().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(store = %store.describe(), error = %e, "Storage unavailable");
            false
        }
    };

    // 1. Scheduling gate
    if opts.schedule {
        let last_run = if store_ready {
            store.last_run_at().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Could not read last run time");
                None
            })
        } else {
            None
        };
        if !should_run(started_at, last_run, &config.scheduling) {
            let next = compute_next_run(started_at, &config.scheduling);
            tracing::info!(next_run = %next.to_rfc3339(), "Run not due, skipping");
            println!("Not due. Next run at {}", next.to_rfc3339());
            return Ok(());
        }
    }

    std::fs::create_dir_all(&opts.out_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            opts.out_dir.display()
        )
    })?;

    // 2. Discover
    let registry = SourceRegistry::builtin().with_priority(&config.source_priority);
    let mut orchestrator = Orchestrator::new(fetcher).with_registry(registry);
    if config.enrichment.enabled {
        match KeywordEnricher::from_config(&config.enrichment) {
            Ok(enricher) => orchestrator = orchestrator.with_enricher(enricher),
            Err(e) => tracing::warn!(error = %e, "Enrichment disabled"),
        }
    }

    tracing::debug!(order = ?orchestrator.registry().sources(), "Source order");

    let mut ctx = ScrapeContext::live(&config.scraper);
    let report = orchestrator.run(&config, &mut ctx).await;

    // 3. Filter
    let total_discovered = report.jobs.len();
    let (jobs, filtered_out) = JobFilter::from_config(&config.filters).apply(report.jobs);
    let scores = if report.enrichment_applied {
        score_jobs(&jobs, &config.scoring)
    } else {
        Vec::new()
    };

    let counts = RunCounts {
        total_discovered,
        filtered_out,
        exported: jobs.len(),
    };
    let summary = RunSummary::new(
        started_at,
        &config,
        counts,
        ctx.metrics.snapshot(),
        report.source_status,
    );

    // 4. Export
    if !opts.summary_only {
        let path = export::write_jobs_csv(&opts.out_dir, &summary.run_ts, &jobs)?;
        tracing::info!(path = %path.display(), rows = jobs.len(), "Exported jobs");
        if report.enrichment_applied {
            let path = export::write_enriched_json(&opts.out_dir, &summary.run_ts, &jobs)?;
            tracing::info!(path = %path.display(), "Exported enriched jobs");
            let path = export::write_scores_csv(&opts.out_dir, &summary.run_ts, &scores)?;
            tracing::info!(path = %path.display(), "Exported scores");
        }
    }
    let path = export::write_summary(&opts.out_dir, &summary)?;
    tracing::info!(path = %path.display(), "Wrote run summary");

    // 5. Persist and prune
    if store_ready {
        if let Err(e) = persist(&store, &summary, &jobs, report.enrichment_applied, &scores).await
        {
            tracing::warn!(store = %store.describe(), error = %e, "Failed to persist run");
        }
        if config.retention.enabled {
            match store.prune(&config.retention, Utc::now()).await {
                Ok(pruned) if !pruned.deleted_runs.is_empty() => {
                    tracing::info!(deleted = ?pruned.deleted_runs, "Retention applied");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Retention failed"),
            }
        }
    }

    println!("{}", summary.pretty_print());
    Ok(())
}

async fn persist(
    store: &Store,
    summary: &RunSummary,
    jobs: &[scout_core::CanonicalJob],
    enriched: bool,
    scores: &[scout_core::ScoredJob],
) -> Result<(), scout_core::AppError> {
    store.insert_run(summary).await?;
    let written = store.insert_jobs(&summary.run_ts, jobs).await?;
    tracing::debug!(run_ts = %summary.run_ts, written, "Stored jobs");
    if enriched {
        store.insert_enriched(&summary.run_ts, jobs).await?;
        store.insert_scores(&summary.run_ts, scores).await?;
    }
    Ok(())
}

async fn cmd_prune(config: &PipelineConfig) -> Result<()> {
    let store = Store::from_config(&config.storage);
    store.init().await.map_err(|e| anyhow::anyhow!(e))?;

    let report = store
        .prune(&config.retention, Utc::now())
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("Failed to prune {}", store.describe()))?;

    if report.deleted_runs.is_empty() {
        println!("Nothing to prune ({} runs kept)", report.kept_runs.len());
        return Ok(());
    }

    println!("Deleted {} runs:", report.deleted_runs.len());
    for run_ts in &report.deleted_runs {
        println!("  {run_ts}");
    }
    println!("Kept {} runs", report.kept_runs.len());
    Ok(())
}

fn cmd_validate(config: &PipelineConfig) {
    let problems = config.validate();
    if problems.is_empty() {
        println!("Configuration OK");
        print_enabled(config);
        return;
    }

    println!("Found {} problem(s):", problems.len());
    for problem in &problems {
        println!("  - {problem}");
    }
    print_enabled(config);
}

fn print_enabled(config: &PipelineConfig) {
    let enabled: Vec<&str> = config
        .enabled_sources()
        .iter()
        .map(|s| s.as_str())
        .collect();
    if enabled.is_empty() {
        println!("Sources enabled: none");
    } else {
        println!("Sources enabled: {}", enabled.join(", "));
    }
}
