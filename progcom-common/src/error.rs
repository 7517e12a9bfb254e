//! Common error types for progcom

use thiserror::Error;

/// Common result type for progcom operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the progcom crates
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing configuration field: {field}")]
    ConfigMissing { field: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream unavailable after {attempts} attempts (last status: {last_status:?})")]
    UpstreamUnavailable {
        attempts: u32,
        last_status: Option<u16>,
    },

    #[error("Upstream request timed out")]
    UpstreamTimeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Upstream returned {status}: {body}")]
    UpstreamClientError { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Wire format mismatch at {path}: {cause}")]
    WireError { path: String, cause: String },

    #[error("Track taxonomy mismatch: proposals only {only_in_proposals:?}, reviewers only {only_in_reviewers:?}")]
    TrackMismatch {
        only_in_proposals: Vec<String>,
        only_in_reviewers: Vec<String>,
    },

    #[error("No schedule: {0}")]
    NoSchedule(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for transport-level failures that a retry might resolve.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnavailable { .. } | Error::UpstreamTimeout
        )
    }

    /// True when the upstream reported a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
            || matches!(self, Error::UpstreamClientError { status: 404, .. })
    }
}
