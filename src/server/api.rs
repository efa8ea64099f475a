//! REST API handlers for the quote server
//!
//! This module defines the routes and handlers exposed by [`super::QuoteServer`].

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::quote::QuoteResponse;
use crate::storage::QuoteRecord;

use super::server::AppState;

/// Default number of rows returned by the history endpoint
const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Upper bound on rows returned by the history endpoint
const MAX_HISTORY_LIMIT: usize = 100;

// ============================================================================
// API Response Types
// ============================================================================

/// Simple error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// History query parameters
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// History response
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub quotes: Vec<QuoteRecord>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/cotacao", get(get_quote))
        .route("/cotacao/history", get(get_history))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Fetch the current quote, persist it and return the bid
///
/// A storage failure is logged but still answers with the fetched bid.
async fn get_quote(State(state): State<AppState>) -> axum::response::Response {
    let rate = match state.fetcher.fetch().await {
        Ok(rate) => rate,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch exchange rate");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("failed to fetch exchange rate")),
            )
                .into_response();
        }
    };

    match state.store.save(rate.bid()).await {
        Ok(id) => tracing::debug!(id, bid = %rate.bid(), "Quote persisted"),
        Err(e) => tracing::error!(error = %e, bid = %rate.bid(), "Failed to persist quote"),
    }

    (StatusCode::OK, Json(QuoteResponse::from(&rate))).into_response()
}

/// Latest persisted quotes
async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> axum::response::Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || store.recent(limit)).await;

    match result {
        Ok(Ok(quotes)) => (StatusCode::OK, Json(HistoryResponse { quotes })).into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to read quote history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("failed to read quote history")),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Quote history task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("failed to read quote history")),
            )
                .into_response()
        }
    }
}
