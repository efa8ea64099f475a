//! Unified error handling for the cepquote crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`CepQuoteErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use cepquote::error::{CepQuoteErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err.category().description());
//!     } else {
//!         eprintln!("Fatal error: {}", err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::client::ClientError;
pub use crate::lookup::LookupError;
pub use crate::race::RaceError;
pub use crate::server::ServerError;
pub use crate::storage::StorageError;
pub use crate::utils::error::{FetchError, UpstreamError};

/// Common trait for all cepquote error types
pub trait CepQuoteErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Payload decoding errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Configuration and usage errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Human-readable description of the category
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::Parsing => "parsing error",
            Self::Storage => "storage error",
            Self::Config => "configuration error",
            Self::Other => "other error",
        }
    }
}

/// Unified error type for the cepquote crate
#[derive(Error, Debug)]
pub enum Error {
    /// CEP lookup errors
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Race errors raised outside a lookup
    #[error("Race error: {0}")]
    Race(#[from] RaceError),

    /// Exchange-rate fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Quote store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Quote client errors
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Quote server errors
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CepQuoteErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Lookup(LookupError::Race(e)) | Self::Race(e) => e.is_recoverable(),
            Self::Lookup(LookupError::InvalidCep(_)) => false,
            Self::Lookup(LookupError::Init(e)) => e.is_recoverable(),
            Self::Fetch(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::Client(e) => e.is_recoverable(),
            Self::Server(_) => false,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Lookup(LookupError::InvalidCep(_)) => ErrorCategory::Config,
            Self::Lookup(_) | Self::Fetch(FetchError::Http(_)) => ErrorCategory::Network,
            Self::Race(RaceError::Timeout(_)) => ErrorCategory::Network,
            Self::Race(_) => ErrorCategory::Config,
            Self::Fetch(FetchError::Decode(_) | FetchError::EmptyBid) => ErrorCategory::Parsing,
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Client(ClientError::Decode(_) | ClientError::EmptyBid) => ErrorCategory::Parsing,
            Self::Client(ClientError::Write { .. }) => ErrorCategory::Storage,
            Self::Client(_) => ErrorCategory::Network,
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Server(ServerError::Bind(_)) => ErrorCategory::Config,
            Self::Server(_) => ErrorCategory::Other,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
