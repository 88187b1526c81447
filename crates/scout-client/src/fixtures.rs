//! Offline feeds for dry runs and tests.

use std::collections::BTreeMap;
use std::path::Path;

use scout_core::error::AppError;
use scout_core::models::Source;
use scout_core::traits::{FeedFetcher, FeedRequest};
use serde_json::Value;

/// Serves a fixed JSON document per source, ignoring the request URL.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    feeds: BTreeMap<Source, Value>,
}

impl FixtureFetcher {
    pub fn from_map(feeds: BTreeMap<Source, Value>) -> Self {
        Self { feeds }
    }

    /// Loads `<dir>/<source>.json` for every known source. Missing files are
    /// skipped; a file that isn't valid JSON is an error.
    pub fn from_dir(dir: &Path) -> Result<Self, AppError> {
        let mut feeds = BTreeMap::new();
        for source in Source::ALL {
            let path = dir.join(format!("{}.json", source.as_str()));
            if !path.is_file() {
                continue;
            }
            let raw = std::fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&raw).map_err(|e| {
                AppError::ConfigError(format!("Invalid fixture {}: {e}", path.display()))
            })?;
            tracing::debug!(source = %source, path = %path.display(), "Loaded fixture");
            feeds.insert(source, value);
        }
        Ok(Self { feeds })
    }

    pub fn with_feed(mut self, source: Source, feed: Value) -> Self {
        self.feeds.insert(source, feed);
        self
    }

    pub fn sources(&self) -> Vec<Source> {
        self.feeds.keys().copied().collect()
    }
}

impl FeedFetcher for FixtureFetcher {
    async fn fetch_feed(&self, request: &FeedRequest) -> Result<Value, AppError> {
        self.feeds.get(&request.source).cloned().ok_or_else(|| {
            AppError::HttpError(format!("HTTP 404 for {} (no fixture)", request.url))
        })
    }
}
