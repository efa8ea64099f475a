//! USD/BRL exchange-rate model
//!
//! [`ExchangeRate`] mirrors the upstream payload; [`QuoteResponse`] is the
//! trimmed body the quote server hands to clients.

pub mod fetcher;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use fetcher::QuoteFetcher;

/// Full upstream payload, keyed by currency pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    #[serde(rename = "USDBRL")]
    pub usdbrl: PairQuote,
}

/// One currency pair quote; every value is a string upstream
///
/// Absent fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairQuote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

impl ExchangeRate {
    /// Build a payload that only carries a bid
    pub fn with_bid(bid: impl Into<String>) -> Self {
        Self {
            usdbrl: PairQuote {
                bid: bid.into(),
                ..Default::default()
            },
        }
    }

    /// Current bid
    pub fn bid(&self) -> &str {
        &self.usdbrl.bid
    }

    /// Decode either the full typed payload or any JSON object carrying
    /// `USDBRL.bid` as a string
    ///
    /// Returns `None` when the body is not JSON at all.
    pub fn parse_lenient(body: &[u8]) -> Option<Self> {
        if let Ok(rate) = serde_json::from_slice::<Self>(body) {
            return Some(rate);
        }

        let raw: Value = serde_json::from_slice(body).ok()?;
        tracing::debug!(payload = %raw, "Exchange rate payload did not match expected shape");

        let bid = raw
            .get("USDBRL")
            .and_then(|pair| pair.get("bid"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        Some(Self::with_bid(bid))
    }
}

/// Trimmed payload served by `GET /cotacao`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub bid: String,
}

impl QuoteResponse {
    /// Decode `{"bid": ...}`, falling back to any JSON object with a string `bid`
    ///
    /// Returns `None` when the body is not JSON at all.
    pub fn parse_lenient(body: &[u8]) -> Option<Self> {
        if let Ok(quote) = serde_json::from_slice::<Self>(body) {
            return Some(quote);
        }

        let raw: Value = serde_json::from_slice(body).ok()?;
        let bid = raw.get("bid").and_then(Value::as_str).unwrap_or_default();

        Some(Self {
            bid: bid.to_string(),
        })
    }
}

impl From<&ExchangeRate> for QuoteResponse {
    fn from(rate: &ExchangeRate) -> Self {
        Self {
            bid: rate.usdbrl.bid.clone(),
        }
    }
}
