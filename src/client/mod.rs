//! Quote client
//!
//! Calls the quote server's `GET /cotacao` under a short timeout and writes
//! the bid to a text file as `Dólar: {bid}`.

use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::quote::QuoteResponse;
use crate::utils::join_url;

/// Errors raised by [`QuoteClient`]
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request to quote server timed out")]
    Timeout,

    /// Server answered with a non-success status
    #[error("Quote server returned status {0}")]
    Status(u16),

    /// Body was not JSON
    #[error("Failed to decode quote response: {0}")]
    Decode(String),

    /// Body carried no bid
    #[error("Empty bid in quote response")]
    EmptyBid,

    /// Writing the output file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Check if calling the server again could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Status(code) => *code >= 500,
            Self::Decode(_) | Self::EmptyBid | Self::Write { .. } => false,
        }
    }
}

/// Client for the quote server
pub struct QuoteClient {
    http_client: Client,
    server_url: String,
    output_path: PathBuf,
}

impl QuoteClient {
    /// Create a new quote client
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http_client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http_client,
            server_url: config.server_url.clone(),
            output_path: config.output_path.clone(),
        })
    }

    /// Create a client for `server_url` with an explicit timeout and output path
    pub fn with_target(
        server_url: &str,
        timeout: Duration,
        output_path: impl Into<PathBuf>,
    ) -> Result<Self, ClientError> {
        Self::new(&ClientConfig {
            server_url: server_url.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            output_path: output_path.into(),
        })
    }

    /// Output file path
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Fetch the current bid from the server
    pub async fn fetch_bid(&self) -> Result<String, ClientError> {
        let url = join_url(&self.server_url, "cotacao");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_request)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(ClientError::from_request)?;
        tracing::debug!(body = %String::from_utf8_lossy(&body), "Quote server response");

        let quote = QuoteResponse::parse_lenient(&body)
            .ok_or_else(|| ClientError::Decode("response is not valid JSON".to_string()))?;

        if quote.bid.is_empty() {
            return Err(ClientError::EmptyBid);
        }

        Ok(quote.bid)
    }

    /// Write `Dólar: {bid}` to the output file, replacing previous content
    pub async fn save_bid(&self, bid: &str) -> Result<(), ClientError> {
        tokio::fs::write(&self.output_path, format_bid_line(bid))
            .await
            .map_err(|source| ClientError::Write {
                path: self.output_path.clone(),
                source,
            })
    }

    /// Fetch the bid and write it to the output file
    pub async fn run(&self) -> Result<String, ClientError> {
        let bid = self.fetch_bid().await?;
        self.save_bid(&bid).await?;

        tracing::info!(bid = %bid, path = %self.output_path.display(), "Quote saved");
        Ok(bid)
    }
}

/// Line written to the output file
pub fn format_bid_line(bid: &str) -> String {
    format!("Dólar: {bid}")
}
