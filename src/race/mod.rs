//! First-response race over concurrent upstreams
//!
//! Every upstream resolves the same key on its own task. The first
//! successful [`LookupResult`] wins; upstream failures only remove that
//! candidate from contention. When no upstream succeeds before the deadline
//! the race fails with [`RaceError::Timeout`].
//!
//! Losing calls are not cancelled. They run until they finish or hit their
//! own per-call timeout, and whatever they produce is dropped.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use cepquote::race::{race, Upstream};
//!
//! let upstreams: Vec<Arc<dyn Upstream>> = vec![Arc::new(a), Arc::new(b)];
//! let winner = race("01001000", &upstreams, Duration::from_secs(1)).await?;
//! println!("{}", winner.source);
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::lookup::LookupResult;
use crate::utils::error::UpstreamError;

/// A named provider able to resolve a key into a [`LookupResult`]
///
/// Implementations must bound their own latency; the race never cancels
/// them.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Resolve a key
    async fn resolve(&self, key: &str) -> Result<LookupResult, UpstreamError>;
}

/// Errors surfaced by [`race`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaceError {
    /// No upstream succeeded before the deadline
    #[error("No upstream answered successfully within {0:?}")]
    Timeout(Duration),

    /// The upstream set was empty
    #[error("No upstreams supplied")]
    NoUpstreams,

    /// The deadline was zero
    #[error("Race timeout must be greater than zero")]
    InvalidTimeout,
}

impl RaceError {
    /// Timeouts are worth another attempt, usage errors are not
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Resolve `key` against every upstream and return the first success
///
/// # Errors
///
/// - [`RaceError::NoUpstreams`] immediately when `upstreams` is empty
/// - [`RaceError::InvalidTimeout`] immediately when `timeout` is zero
/// - [`RaceError::Timeout`] when nothing succeeds before `timeout` elapses,
///   even if every upstream has already failed
pub async fn race(
    key: &str,
    upstreams: &[Arc<dyn Upstream>],
    timeout: Duration,
) -> Result<LookupResult, RaceError> {
    if upstreams.is_empty() {
        return Err(RaceError::NoUpstreams);
    }
    if timeout.is_zero() {
        return Err(RaceError::InvalidTimeout);
    }

    // One slot per upstream so a late winner never blocks on send.
    let (tx, mut rx) = mpsc::channel::<LookupResult>(upstreams.len());

    for upstream in upstreams {
        let upstream = Arc::clone(upstream);
        let tx = tx.clone();
        let key = key.to_string();

        tokio::spawn(async move {
            match upstream.resolve(&key).await {
                Ok(result) => {
                    tracing::debug!(upstream = %upstream.name(), key = %key, "Upstream resolved");
                    // Fails only after the race has concluded.
                    let _ = tx.send(result).await;
                }
                Err(e) => {
                    tracing::warn!(
                        upstream = %upstream.name(),
                        key = %key,
                        error = %e,
                        "Upstream failed"
                    );
                }
            }
        });
    }

    // `tx` is held until return, so recv() only completes on a success.
    let outcome = tokio::time::timeout(timeout, rx.recv()).await;
    drop(tx);

    match outcome {
        Ok(Some(result)) => {
            tracing::info!(key = %key, source = %result.source, "Race won");
            Ok(result)
        }
        Ok(None) | Err(_) => {
            tracing::warn!(key = %key, timeout_ms = timeout.as_millis() as u64, "Race timed out");
            Err(RaceError::Timeout(timeout))
        }
    }
}
