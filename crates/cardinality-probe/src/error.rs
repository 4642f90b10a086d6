//! Probe error types.

use http::StatusCode;
use thiserror::Error;

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can end a probe cycle. None of them are fatal to the process.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot create GET request to {url}: {reason}")]
    RequestConstruction { url: String, reason: String },

    #[error("can't connect to {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("request to {url} returned status {status}")]
    UpstreamStatus { url: String, status: StatusCode },

    #[error("can't read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: hyper::Error,
    },

    #[error("can't parse json from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProbeError {
    /// Short category name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::RequestConstruction { .. } => "request_construction",
            ProbeError::Transport { .. } => "transport",
            ProbeError::UpstreamStatus { .. } => "upstream_status",
            ProbeError::BodyRead { .. } => "body_read",
            ProbeError::Decode { .. } => "decode",
        }
    }
}
