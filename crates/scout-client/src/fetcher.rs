use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use scout_core::error::AppError;
use scout_core::traits::{FeedFetcher, FeedRequest};
use serde_json::Value;
use url::Url;

/// Feed fetcher using reqwest.
///
/// Issues a GET against the source's configured URL and parses the body as
/// JSON. When the request carries an API key it is sent as a bearer token.
#[derive(Clone)]
pub struct ReqwestFeedFetcher {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestFeedFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let timeout_secs = timeout.as_secs();
        let client = Client::builder()
            .user_agent("scout/0.1 (job discovery)")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

impl FeedFetcher for ReqwestFeedFetcher {
    async fn fetch_feed(&self, request: &FeedRequest) -> Result<Value, AppError> {
        let url = validate_url(&request.url)?;

        let mut builder = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(key) = &request.api_key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                request.url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;

        tracing::debug!(source = %request.source, bytes = body.len(), "Feed downloaded");

        serde_json::from_str(&body).map_err(|e| {
            AppError::MalformedResponse(format!("{} did not return JSON: {e}", request.source))
        })
    }
}

/// Only `http` and `https` URLs with a host are fetched.
fn validate_url(raw: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(raw).map_err(|e| AppError::HttpError(format!("Invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::HttpError(format!(
                "URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::HttpError("URL has no host".to_string()));
    }

    Ok(parsed)
}
