//! GitHub API error types

use thiserror::Error;

/// GitHub API errors
#[derive(Debug, Error)]
pub enum GithubError {
    /// Request could not be sent
    #[error("GitHub request failed: {0}")]
    RequestFailed(String),

    /// API returned a non-success status
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response could not be decoded
    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),
}
