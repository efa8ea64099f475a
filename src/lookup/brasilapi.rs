//! BrasilAPI CEP upstream

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::LookupResult;
use crate::race::Upstream;
use crate::utils::error::UpstreamError;
use crate::utils::join_url;

/// Default BrasilAPI endpoint
pub const DEFAULT_BASE_URL: &str = "https://brasilapi.com.br";

/// Source tag for results from this upstream
pub const SOURCE: &str = "Brasil API";

/// Error body BrasilAPI returns for unknown or invalid CEPs
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Successful BrasilAPI v1 payload
///
/// Any field may be absent or `null`; both read as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CepBody {
    cep: Option<String>,
    state: Option<String>,
    city: Option<String>,
    neighborhood: Option<String>,
    street: Option<String>,
}

impl From<CepBody> for LookupResult {
    fn from(body: CepBody) -> Self {
        Self {
            cep: body.cep.unwrap_or_default(),
            street: body.street.unwrap_or_default(),
            neighborhood: body.neighborhood.unwrap_or_default(),
            city: body.city.unwrap_or_default(),
            state: body.state.unwrap_or_default(),
            source: SOURCE.to_string(),
            ..Default::default()
        }
    }
}

/// Resolves CEPs through `GET /api/cep/v1/{cep}`
pub struct BrasilApiUpstream {
    client: Client,
    base_url: String,
}

impl BrasilApiUpstream {
    /// Create an upstream against the public endpoint
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Http` if the HTTP client cannot be created
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Create an upstream with a custom base URL, e.g. a mock server
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Http` if the HTTP client cannot be created
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Decode a 200 response body
    fn parse_body(body: &[u8]) -> Result<LookupResult, UpstreamError> {
        if let Ok(err) = serde_json::from_slice::<ErrorBody>(body) {
            if !err.message.is_empty() {
                return Err(UpstreamError::Rejected(err.message));
            }
        }

        let parsed: CepBody =
            serde_json::from_slice(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        if parsed.cep.as_deref().unwrap_or_default().is_empty() {
            return Err(UpstreamError::MissingField("cep"));
        }

        Ok(parsed.into())
    }
}

#[async_trait]
impl Upstream for BrasilApiUpstream {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn resolve(&self, key: &str) -> Result<LookupResult, UpstreamError> {
        let url = join_url(&self.base_url, &format!("api/cep/v1/{key}"));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(UpstreamError::from_request)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(UpstreamError::from_request)?;
        Self::parse_body(&body)
    }
}
