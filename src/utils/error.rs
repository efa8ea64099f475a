//! Error types for HTTP upstreams
//!
//! This module defines the errors raised by the CEP upstreams and by the
//! exchange-rate fetcher.

use thiserror::Error;

/// Errors that can occur while a single CEP upstream resolves a key
///
/// These never escape a race; they only mark one candidate as failed.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {0}")]
    Status(u16),

    /// Upstream answered with an explicit error message
    #[error("Upstream rejected request: {0}")]
    Rejected(String),

    /// Upstream reports that the key does not exist
    #[error("Postal code not found")]
    NotFound,

    /// Payload could not be decoded
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Required field is missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl UpstreamError {
    /// Map a reqwest error, keeping timeouts distinct
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Check if retrying the same upstream could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Status(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
            Self::Rejected(_) | Self::NotFound | Self::Malformed(_) | Self::MissingField(_) => {
                false
            }
        }
    }
}

/// Errors that can occur while fetching the USD/BRL quote
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// The payload parsed but carried no bid
    #[error("Empty bid in exchange rate payload")]
    EmptyBid,
}

impl FetchError {
    /// Map a reqwest error, keeping timeouts distinct
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Check if the fetch may succeed when tried again later
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimit | Self::Timeout => true,
            Self::ServerError(code) => *code >= 500,
            Self::Decode(_) | Self::EmptyBid => false,
        }
    }
}
