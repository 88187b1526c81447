//! Typed pipeline configuration.
//!
//! Loaded from an optional JSON file, then overridden from the process
//! environment (after `.env` has been read by the binary). Every section
//! has defaults, so an empty file or no file at all is a valid config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Source;
use crate::util::{parse_bool, parse_list};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub system: SystemConfig,
    pub sources: BTreeMap<Source, SourceSettings>,
    /// Sources listed here run first, in this order.
    pub source_priority: Vec<Source>,
    pub scraper: ScraperConfig,
    pub filters: FilterConfig,
    pub enrichment: EnrichmentConfig,
    pub scoring: ScoringConfig,
    pub scheduling: ScheduleConfig,
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub output_directory: PathBuf,
    pub environment: String,
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("output"),
            environment: "development".into(),
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub enabled: bool,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

/// Rate limit and retry knobs shared by every adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Requests per minute across all sources.
    pub rpm: u32,
    pub max_retries: u32,
    pub backoff_base_secs: f64,
    pub backoff_max_secs: f64,
    pub jitter_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            rpm: 30,
            max_retries: 3,
            backoff_base_secs: 0.5,
            backoff_max_secs: 4.0,
            jitter_ms: 100,
            timeout_secs: 30,
        }
    }
}

/// Include/exclude keyword filters applied to discovered jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    pub exclude_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub keywords: EnrichmentKeywords,
    pub remote_aliases: Vec<String>,
    /// Regex over the normalized title → seniority label. Checked in key order.
    pub seniority_patterns: BTreeMap<String, String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            keywords: EnrichmentKeywords::default(),
            remote_aliases: vec![
                "remote".into(),
                "work from home".into(),
                "distributed".into(),
            ],
            seniority_patterns: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentKeywords {
    pub role: Vec<String>,
    pub stack: Vec<String>,
}

impl Default for EnrichmentKeywords {
    fn default() -> Self {
        Self {
            role: ["engineer", "developer", "architect", "sre"]
                .map(String::from)
                .to_vec(),
            stack: ["python", "rust", "go", "java", "typescript", "aws", "kubernetes"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Feature name → weight. `role_fit`, `stack`, and `remote` map onto
    /// the enrichment's role tags, stack tags, and remote flag.
    pub weights: BTreeMap<String, f64>,
    pub thresholds: Thresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                ("role_fit".to_string(), 0.5),
                ("stack".to_string(), 0.3),
                ("remote".to_string(), 0.2),
            ]),
            thresholds: Thresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub exceptional: f64,
    pub strong: f64,
    pub moderate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            exceptional: 0.8,
            strong: 0.6,
            moderate: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    #[default]
    Interval,
    Window,
}

impl FromStr for ScheduleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interval" => Ok(ScheduleMode::Interval),
            "window" => Ok(ScheduleMode::Window),
            _ => Err(format!("Unknown scheduling mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub mode: ScheduleMode,
    pub interval_minutes: i64,
    /// Daily `HH:MM` (UTC) window used in window mode.
    pub window_time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            mode: ScheduleMode::Interval,
            interval_minutes: 60,
            window_time: "09:00".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "json" => Ok(StorageBackend::Json),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub sqlite_path: PathBuf,
    pub json_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            sqlite_path: PathBuf::from("data/scout.db"),
            json_dir: PathBuf::from("data/runs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub enabled: bool,
    /// Runs older than this many days are eligible for deletion.
    /// `None` disables pruning.
    pub days: Option<i64>,
    /// The newest N runs always survive. Values below 1 count as 1.
    pub keep_latest_n_runs: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            days: None,
            keep_latest_n_runs: 1,
        }
    }
}

impl RetentionConfig {
    pub fn keep_latest(&self) -> usize {
        self.keep_latest_n_runs.max(1) as usize
    }
}

impl PipelineConfig {
    /// Load from `path` if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                AppError::ConfigError(format!("Failed to read {}: {e}", path.display()))
            })?;
            serde_json::from_str(&raw).map_err(|e| {
                AppError::ConfigError(format!("Invalid JSON in {}: {e}", path.display()))
            })?
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Settings for `source`, or disabled defaults when it isn't configured.
    pub fn source_settings(&self, source: Source) -> SourceSettings {
        self.sources.get(&source).cloned().unwrap_or_default()
    }

    /// Sources currently enabled, in `Source` order.
    pub fn enabled_sources(&self) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|s| self.source_settings(*s).enabled)
            .collect()
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        for source in Source::ALL {
            let prefix = source.env_prefix();
            let entry = self.sources.entry(source).or_default();

            if let Some(raw) = get(&format!("{prefix}_ENABLED")) {
                entry.enabled = env_bool(&format!("{prefix}_ENABLED"), &raw)?;
            }
            if let Some(url) = get(&format!("{prefix}_API_URL")) {
                entry.api_url = Some(url.trim().to_string());
            }
            let key = get(&format!("{prefix}_API_KEY")).or_else(|| match source {
                Source::Indeed => get("INDEED_PUBLISHER_KEY"),
                _ => None,
            });
            if let Some(key) = key {
                entry.api_key = Some(key.trim().to_string());
            }
        }

        if let Some(raw) = get("SYSTEM_OUTPUT_DIRECTORY") {
            self.system.output_directory = PathBuf::from(raw.trim());
        }
        if let Some(raw) = get("SYSTEM_ENVIRONMENT") {
            self.system.environment = raw.trim().to_string();
        }
        if let Some(raw) = get("SYSTEM_LOG_LEVEL") {
            self.system.log_level = raw.trim().to_lowercase();
        }

        if let Some(raw) = get("SCRAPER_RPM") {
            self.scraper.rpm = env_parse("SCRAPER_RPM", &raw)?;
        }
        if let Some(raw) = get("SCRAPER_MAX_RETRIES") {
            self.scraper.max_retries = env_parse("SCRAPER_MAX_RETRIES", &raw)?;
        }
        if let Some(raw) = get("SCRAPER_BACKOFF_BASE") {
            self.scraper.backoff_base_secs = env_parse("SCRAPER_BACKOFF_BASE", &raw)?;
        }
        if let Some(raw) = get("SCRAPER_BACKOFF_MAX") {
            self.scraper.backoff_max_secs = env_parse("SCRAPER_BACKOFF_MAX", &raw)?;
        }
        if let Some(raw) = get("SCRAPER_JITTER_MS") {
            self.scraper.jitter_ms = env_parse("SCRAPER_JITTER_MS", &raw)?;
        }
        if let Some(raw) = get("SCRAPER_TIMEOUT") {
            self.scraper.timeout_secs = env_parse("SCRAPER_TIMEOUT", &raw)?;
        }

        if let Some(raw) = get("JOB_FILTER_KEYWORDS") {
            self.filters.keywords = parse_list(&raw);
        }
        if let Some(raw) = get("JOB_FILTER_LOCATIONS") {
            self.filters.locations = parse_list(&raw);
        }
        if let Some(raw) = get("JOB_FILTER_EXCLUDE_KEYWORDS") {
            self.filters.exclude_keywords = parse_list(&raw);
        }

        if let Some(raw) = get("STORAGE_BACKEND") {
            self.storage.backend = raw.parse::<StorageBackend>().map_err(AppError::ConfigError)?;
        }
        if let Some(raw) = get("STORAGE_SQLITE_PATH") {
            self.storage.sqlite_path = PathBuf::from(raw.trim());
        }
        if let Some(raw) = get("STORAGE_JSON_DIR") {
            self.storage.json_dir = PathBuf::from(raw.trim());
        }

        if let Some(raw) = get("RETENTION_ENABLED") {
            self.retention.enabled = env_bool("RETENTION_ENABLED", &raw)?;
        }
        if let Some(raw) = get("RETENTION_DAYS") {
            self.retention.days = Some(env_parse("RETENTION_DAYS", &raw)?);
        }
        if let Some(raw) = get("RETENTION_KEEP_LATEST_N_RUNS") {
            self.retention.keep_latest_n_runs = env_parse("RETENTION_KEEP_LATEST_N_RUNS", &raw)?;
        }

        if let Some(raw) = get("SCHEDULING_MODE") {
            self.scheduling.mode = raw.parse::<ScheduleMode>().map_err(AppError::ConfigError)?;
        }
        if let Some(raw) = get("SCHEDULING_INTERVAL_MINUTES") {
            self.scheduling.interval_minutes = env_parse("SCHEDULING_INTERVAL_MINUTES", &raw)?;
        }
        if let Some(raw) = get("SCHEDULING_WINDOW_TIME") {
            self.scheduling.window_time = raw.trim().to_string();
        }

        if let Some(raw) = get("ENRICHMENT_ENABLED") {
            self.enrichment.enabled = env_bool("ENRICHMENT_ENABLED", &raw)?;
        }

        Ok(())
    }

    /// Human-readable problems with this configuration. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (source, settings) in &self.sources {
            let has_url = settings
                .api_url
                .as_deref()
                .is_some_and(|u| !u.trim().is_empty());
            if settings.enabled && !has_url {
                let prefix = source.env_prefix();
                problems.push(format!(
                    "{prefix}_ENABLED is set but {prefix}_API_URL is missing"
                ));
            }
        }

        let scraper = &self.scraper;
        if scraper.rpm == 0 {
            problems.push("SCRAPER_RPM must be greater than 0".into());
        }
        if scraper.max_retries > 10 {
            problems.push(format!(
                "SCRAPER_MAX_RETRIES must be between 0 and 10 (got {})",
                scraper.max_retries
            ));
        }
        if scraper.backoff_base_secs <= 0.0 || scraper.backoff_max_secs <= 0.0 {
            problems.push("SCRAPER_BACKOFF_BASE and SCRAPER_BACKOFF_MAX must be positive".into());
        } else if scraper.backoff_base_secs > scraper.backoff_max_secs {
            problems.push("SCRAPER_BACKOFF_BASE must not exceed SCRAPER_BACKOFF_MAX".into());
        }
        if scraper.jitter_ms > 10_000 {
            problems.push(format!(
                "SCRAPER_JITTER_MS must be between 0 and 10000 (got {})",
                scraper.jitter_ms
            ));
        }

        if self.scheduling.interval_minutes <= 0 {
            problems.push("SCHEDULING_INTERVAL_MINUTES must be positive".into());
        }
        if chrono::NaiveTime::parse_from_str(self.scheduling.window_time.trim(), "%H:%M").is_err() {
            problems.push(format!(
                "SCHEDULING_WINDOW_TIME '{}' is not HH:MM; 09:00 will be used",
                self.scheduling.window_time
            ));
        }
        if self.retention.days.is_some_and(|d| d < 0) {
            problems.push("RETENTION_DAYS must not be negative".into());
        }

        problems
    }
}

fn env_parse<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid {key} '{raw}'")))
}

fn env_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    parse_bool(raw)
        .ok_or_else(|| AppError::ConfigError(format!("Invalid {key} '{raw}': expected a boolean")))
}
