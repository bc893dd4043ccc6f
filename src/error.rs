//! Error types for pagecopy.
//!
//! This module defines the error taxonomy for fetch, extraction, and
//! persistence operations, plus the stable user-facing message each
//! variant maps to.

use std::io;

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The submitted URL is not a well-formed absolute HTTP(S) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// DNS lookup failed for the host.
    #[error("host not found: {0}")]
    DnsFailure(String),

    /// The remote host refused the connection.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// The server answered with a non-success status code.
    #[error("HTTP error {0}")]
    HttpStatus(u16),

    /// The request exceeded the fetch timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Other transport failure (reset, TLS, malformed response).
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The base URL for link resolution is unparseable. Callers validate
    /// this before extraction; malformed document markup never fails.
    #[error("invalid base URL: {0}")]
    BaseUrl(String),

    /// No blob or metadata record exists under the given key.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Blob store I/O failure.
    #[error("storage error: {0}")]
    Storage(#[from] io::Error),

    /// Metadata sidecar (de)serialization failure.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl Error {
    /// Stable user-facing message for this error.
    ///
    /// Internal detail (addresses, error chains, I/O context) is logged,
    /// never shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidUrl(_) => "The URL is not valid".to_string(),
            Error::DnsFailure(_) => "URL not found".to_string(),
            Error::ConnectionRefused(_) => "Connection refused".to_string(),
            Error::HttpStatus(status) => format!("HTTP error {status}"),
            Error::Timeout(_) => "The request timed out".to_string(),
            Error::RequestFailed(_) => "Failed to fetch the page".to_string(),
            Error::BaseUrl(_) => "The base URL is not valid".to_string(),
            Error::NotFound(_) => "Document not found".to_string(),
            Error::Storage(_) => "Failed to store the document".to_string(),
            Error::Metadata(_) => "Failed to read document metadata".to_string(),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
