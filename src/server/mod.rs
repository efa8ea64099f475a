//! Quote server
//!
//! Serves the current USD/BRL bid and keeps a history of every quote it
//! handed out.
//!
//! ```text
//! GET /cotacao          -> {"bid": "5.4111"}
//! GET /cotacao/history  -> {"quotes": [...]}
//! GET /health           -> {"status": "ok", ...}
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use cepquote::config::Config;
//! use cepquote::server::QuoteServer;
//!
//! let config = Config::default();
//! let server = QuoteServer::new(config.server, &config.database)?;
//! server.start_with_shutdown(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

pub mod api;
#[allow(clippy::module_inception)]
pub mod server;

pub use server::{AppState, QuoteServer, ServerError, ServerInfo};
