//! Error types for Bindilla.
//!
//! Every error knows the HTTP status it should be reported with, so the
//! server can turn a failed operation straight into a response.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Bindilla.
#[derive(Debug, Error)]
pub enum BindillaError {
    // Client errors
    #[error("Unknown environ: {0}")]
    UnknownEnviron(String),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // Configuration errors
    #[error("Invalid environ catalog: {message}")]
    Catalog { message: String },

    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    /// The upstream server answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    // Binder errors
    #[error("Launch of {environ} failed: {message}")]
    LaunchFailed { environ: String, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Bindilla operations.
pub type Result<T> = std::result::Result<T, BindillaError>;

impl From<std::io::Error> for BindillaError {
    fn from(err: std::io::Error) -> Self {
        BindillaError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for BindillaError {
    fn from(err: serde_json::Error) -> Self {
        BindillaError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Callers that know their timeout map timeouts to [`BindillaError::Timeout`]
/// themselves.
impl From<reqwest::Error> for BindillaError {
    fn from(err: reqwest::Error) -> Self {
        BindillaError::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl BindillaError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        BindillaError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create an upstream error from a status code, using the canonical reason phrase.
    pub fn upstream(status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        BindillaError::Upstream {
            status,
            message: format!("HTTP {}: {}", status, reason),
        }
    }

    /// The HTTP status code this error is reported with.
    ///
    /// - 400: the request named something that does not exist or is malformed
    /// - 429: Binder is rate limiting us
    /// - 502: Binder could not be reached or the launch failed
    /// - 504: Binder did not answer in time
    /// - upstream errors keep the upstream status
    /// - anything else is a 500
    pub fn status_code(&self) -> u16 {
        match self {
            BindillaError::UnknownEnviron(_) | BindillaError::InvalidRequest { .. } => 400,
            BindillaError::RateLimited { .. } => 429,
            BindillaError::Network { .. } | BindillaError::LaunchFailed { .. } => 502,
            BindillaError::Timeout(_) => 504,
            BindillaError::Upstream { status, .. } => *status,
            _ => 500,
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BindillaError::Network { .. }
            | BindillaError::Timeout(_)
            | BindillaError::RateLimited { .. } => true,
            BindillaError::Upstream { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }
}
