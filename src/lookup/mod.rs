//! CEP (Brazilian postal code) lookup
//!
//! This module holds the normalized [`LookupResult`] record, CEP
//! normalization and the two HTTP upstreams raced against each other:
//!
//! - [`brasilapi::BrasilApiUpstream`] - `brasilapi.com.br`
//! - [`viacep::ViaCepUpstream`] - `viacep.com.br`
//!
//! [`CepLookup`] wires them to [`crate::race::race`] using a
//! [`LookupConfig`].

pub mod brasilapi;
pub mod viacep;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::LookupConfig;
use crate::race::{race, RaceError, Upstream};
use crate::utils::error::UpstreamError;

pub use brasilapi::BrasilApiUpstream;
pub use viacep::ViaCepUpstream;

/// Number of digits in a CEP
pub const CEP_LEN: usize = 8;

/// A resolved address, tagged with the upstream that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    pub cep: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub ibge: String,
    pub ddd: String,

    /// Upstream that answered
    pub source: String,
}

impl LookupResult {
    /// Labelled address fields in display order
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("CEP", self.cep.as_str()),
            ("Logradouro", self.street.as_str()),
            ("Complemento", self.complement.as_str()),
            ("Bairro", self.neighborhood.as_str()),
            ("Localidade", self.city.as_str()),
            ("UF", self.state.as_str()),
            ("IBGE", self.ibge.as_str()),
            ("DDD", self.ddd.as_str()),
        ]
    }
}

impl fmt::Display for LookupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resposta via {}", self.source)?;
        for (label, value) in self.fields() {
            writeln!(f, "{label}: {value}")?;
        }
        Ok(())
    }
}

/// Errors surfaced by [`CepLookup`]
#[derive(Error, Debug)]
pub enum LookupError {
    /// Input does not reduce to eight digits
    #[error("Invalid CEP '{0}': expected 8 digits")]
    InvalidCep(String),

    /// Upstream client could not be built
    #[error("Failed to initialize upstream: {0}")]
    Init(#[from] UpstreamError),

    /// The race itself failed
    #[error(transparent)]
    Race(#[from] RaceError),
}

/// Normalize a CEP to its eight-digit form
///
/// Accepts `84350000` and `84350-000`, ignoring surrounding whitespace.
pub fn normalize_cep(raw: &str) -> Result<String, LookupError> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(|c| *c != '-').collect();

    let dash_ok = match trimmed.find('-') {
        None => true,
        Some(pos) => pos == 5 && trimmed.matches('-').count() == 1,
    };

    if dash_ok && digits.len() == CEP_LEN && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(digits)
    } else {
        Err(LookupError::InvalidCep(raw.to_string()))
    }
}

/// Races a fixed set of CEP upstreams under one deadline
pub struct CepLookup {
    upstreams: Vec<Arc<dyn Upstream>>,
    timeout: Duration,
}

impl CepLookup {
    /// Create a lookup over explicit upstreams
    pub fn new(upstreams: Vec<Arc<dyn Upstream>>, timeout: Duration) -> Self {
        Self { upstreams, timeout }
    }

    /// Build the BrasilAPI + ViaCEP pair from configuration
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Init` if an HTTP client cannot be created
    pub fn from_config(config: &LookupConfig) -> Result<Self, LookupError> {
        let per_call = config.request_timeout();

        let upstreams: Vec<Arc<dyn Upstream>> = vec![
            Arc::new(BrasilApiUpstream::with_base_url(
                &config.brasilapi_url,
                per_call,
            )?),
            Arc::new(ViaCepUpstream::with_base_url(&config.viacep_url, per_call)?),
        ];

        Ok(Self::new(upstreams, config.race_timeout()))
    }

    /// Names of the raced upstreams
    pub fn upstream_names(&self) -> Vec<&str> {
        self.upstreams.iter().map(|u| u.name()).collect()
    }

    /// Normalize `cep` and race it across all upstreams
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidCep` before any request is sent, or
    /// `LookupError::Race` when the race fails
    pub async fn lookup(&self, cep: &str) -> Result<LookupResult, LookupError> {
        let cep = normalize_cep(cep)?;
        tracing::debug!(cep = %cep, upstreams = ?self.upstream_names(), "Starting CEP race");

        Ok(race(&cep, &self.upstreams, self.timeout).await?)
    }
}
