use thiserror::Error;

/// Application-wide error types for scout.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A feed answered with something other than a list of records.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Enrichment could not be applied.
    #[error("Enrichment error: {0}")]
    EnrichmentError(String),
}

impl AppError {
    /// Returns true if this error came from talking to a remote feed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_) | AppError::Timeout(_) | AppError::NetworkError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_classified() {
        assert!(AppError::NetworkError("reset".into()).is_transport());
        assert!(AppError::Timeout(30).is_transport());
        assert!(AppError::HttpError("HTTP 503".into()).is_transport());
        assert!(!AppError::MalformedResponse("object".into()).is_transport());
        assert!(!AppError::ConfigError("bad".into()).is_transport());
    }

    #[test]
    fn serde_errors_convert() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::SerializationError(_)));
    }
}
