//! cepquote - CEP lookup race and USD/BRL quote service
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`race`] - First-successful-response race over concurrent upstreams
//! - [`lookup`] - CEP normalization and the BrasilAPI / ViaCEP upstreams
//! - [`quote`] - USD/BRL exchange-rate model and fetcher
//! - [`storage`] - SQLite quote history
//! - [`server`] - HTTP server serving `GET /cotacao`
//! - [`client`] - Client that saves the served quote to a text file
//! - [`config`] - Configuration management and settings
//! - [`error`] - Unified error type
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use cepquote::config::Config;
//! use cepquote::lookup::CepLookup;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let lookup = CepLookup::from_config(&config.lookup)?;
//!     let address = lookup.lookup("01001-000").await?;
//!     println!("{address}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod quote;
pub mod race;
pub mod server;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::QuoteClient;
    pub use crate::config::Config;
    pub use crate::error::{CepQuoteErrorTrait, Error, ErrorCategory, Result};
    pub use crate::lookup::{CepLookup, LookupResult};
    pub use crate::quote::{ExchangeRate, QuoteFetcher, QuoteResponse};
    pub use crate::race::{race, RaceError, Upstream};
    pub use crate::server::QuoteServer;
    pub use crate::storage::QuoteStore;
}

// Direct re-exports for convenience
pub use lookup::LookupResult;
pub use race::{race, RaceError, Upstream};
