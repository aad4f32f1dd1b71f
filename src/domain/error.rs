//! # Error Taxonomy
//!
//! The source adapter maps whatever shape the upstream API produces into
//! [`SourceError`] so the pipeline can match on a fixed set of kinds instead
//! of inspecting raw payloads.

use thiserror::Error;

/// Failures reported by a [`TimelineSource`](super::traits::TimelineSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request-rate ceiling of the source API was hit.
    #[error("rate limited by the source API")]
    RateLimited,

    /// Connection, TLS, timeout or body-decoding failure below the API layer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The requested list does not exist or is not visible to this account.
    #[error("list not found")]
    NotFound,

    /// Anything the adapter could not classify.
    #[error("source API error: {0}")]
    Unknown(String),
}

/// Fatal startup failures. `main` logs these and exits with status 1 before
/// the poll loop ever starts.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The configured list is unknown. `available` carries the names of the
    /// lists the configured owner actually has, as an operator hint.
    #[error("configured list {list} not found (owned lists: {})", .available.join(", "))]
    ListNotFound { list: String, available: Vec<String> },

    #[error("source initialization failed: {0}")]
    Source(#[from] SourceError),
}
