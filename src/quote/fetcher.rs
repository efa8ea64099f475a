//! Exchange-rate fetcher
//!
//! Fetches the current USD/BRL quote from the configured endpoint. A
//! rate-limited upstream is reported as [`FetchError::RateLimit`]; no
//! placeholder quote is ever substituted.

use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::ExchangeRate;
use crate::config::{ServerConfig, DEFAULT_QUOTE_URL};
use crate::utils::error::FetchError;
use crate::utils::truncate_text;

/// Maximum body length echoed into debug logs
const LOG_BODY_LIMIT: usize = 512;

/// HTTP fetcher for the USD/BRL quote
pub struct QuoteFetcher {
    /// HTTP client with the per-request timeout applied
    client: Client,

    /// Full endpoint URL
    url: String,
}

impl QuoteFetcher {
    /// Create a fetcher against the public endpoint
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_url(DEFAULT_QUOTE_URL, timeout)
    }

    /// Create a fetcher against a custom endpoint, e.g. a mock server
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_url(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Create a fetcher from server configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &ServerConfig) -> Result<Self, FetchError> {
        Self::with_url(&config.quote_url, config.quote_timeout())
    }

    /// Endpoint this fetcher queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current quote
    ///
    /// # Errors
    ///
    /// - `FetchError::RateLimit` on HTTP 429
    /// - `FetchError::ServerError` on any other non-200 status
    /// - `FetchError::Timeout` / `FetchError::Http` on transport failure
    /// - `FetchError::Decode` when the body is not JSON
    /// - `FetchError::EmptyBid` when no bid could be extracted
    pub async fn fetch(&self) -> Result<ExchangeRate, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(url = %self.url, "Exchange rate API is rate limiting requests");
            return Err(FetchError::RateLimit);
        }
        if status != StatusCode::OK {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::from_request)?;
        tracing::debug!(
            body = %truncate_text(&String::from_utf8_lossy(&body), LOG_BODY_LIMIT),
            "Exchange rate API response"
        );

        let rate = ExchangeRate::parse_lenient(&body).ok_or_else(|| {
            FetchError::Decode("exchange rate payload is not valid JSON".to_string())
        })?;

        if rate.bid().is_empty() {
            return Err(FetchError::EmptyBid);
        }

        tracing::debug!(bid = %rate.bid(), "Parsed exchange rate");
        Ok(rate)
    }
}
