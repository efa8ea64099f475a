//! Quote server implementation
//!
//! Owns the shared state and runs the axum router. All dependencies are
//! handed in explicitly; nothing is registered globally.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{DatabaseConfig, ServerConfig};
use crate::quote::QuoteFetcher;
use crate::storage::QuoteStore;

use super::api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Exchange-rate fetcher
    pub fetcher: Arc<QuoteFetcher>,

    /// Quote persistence
    pub store: QuoteStore,

    /// Server start time
    pub start_time: Instant,
}

// ============================================================================
// Quote Server
// ============================================================================

/// HTTP server exposing `GET /cotacao`
pub struct QuoteServer {
    config: ServerConfig,
    state: AppState,
}

impl QuoteServer {
    /// Create a server, building the fetcher and opening the store
    pub fn new(config: ServerConfig, database: &DatabaseConfig) -> Result<Self, ServerError> {
        let fetcher =
            QuoteFetcher::from_config(&config).map_err(|e| ServerError::Init(e.to_string()))?;
        let store = QuoteStore::from_config(database).map_err(|e| ServerError::Init(e.to_string()))?;

        Ok(Self::with_components(config, fetcher, store))
    }

    /// Create a server from already-built components
    pub fn with_components(config: ServerConfig, fetcher: QuoteFetcher, store: QuoteStore) -> Self {
        let state = AppState {
            fetcher: Arc::new(fetcher),
            store,
            start_time: Instant::now(),
        };

        Self { config, state }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Bind the configured address and serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {e}", self.config.bind_address)))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serve on an already-bound listener until `shutdown_signal` resolves
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(
            addr = %addr,
            upstream = %self.state.fetcher.url(),
            "Starting quote server"
        );

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Quote server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            quote_url: self.config.quote_url.clone(),
            quote_timeout_ms: self.config.quote_timeout_ms,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub quote_url: String,
    pub quote_timeout_ms: u64,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Quote Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Upstream: {}\n\
             Upstream Timeout: {}ms\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.quote_url,
            self.quote_timeout_ms,
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),

    /// Failed to bind to address
    #[error("Failed to bind: {0}")]
    Bind(String),

    /// Server error
    #[error("Server error: {0}")]
    Serve(String),
}

// ============================================================================
// Tests
// ============================================================================
