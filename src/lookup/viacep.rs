//! ViaCEP upstream

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::LookupResult;
use crate::race::Upstream;
use crate::utils::error::UpstreamError;
use crate::utils::join_url;

/// Default ViaCEP endpoint
pub const DEFAULT_BASE_URL: &str = "http://viacep.com.br";

/// Source tag for results from this upstream
pub const SOURCE: &str = "ViaCEP API";

/// ViaCEP JSON payload
///
/// Unknown CEPs come back as `{"erro": true}` with status 200. Any field may
/// be absent or `null`; both read as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CepBody {
    cep: Option<String>,
    logradouro: Option<String>,
    complemento: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    ibge: Option<String>,
    ddd: Option<String>,
    erro: Option<Value>,
}

impl CepBody {
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

impl From<CepBody> for LookupResult {
    fn from(body: CepBody) -> Self {
        Self {
            cep: body.cep.unwrap_or_default(),
            street: body.logradouro.unwrap_or_default(),
            complement: body.complemento.unwrap_or_default(),
            neighborhood: body.bairro.unwrap_or_default(),
            city: body.localidade.unwrap_or_default(),
            state: body.uf.unwrap_or_default(),
            ibge: body.ibge.unwrap_or_default(),
            ddd: body.ddd.unwrap_or_default(),
            source: SOURCE.to_string(),
        }
    }
}

/// Resolves CEPs through `GET /ws/{cep}/json/`
pub struct ViaCepUpstream {
    client: Client,
    base_url: String,
}

impl ViaCepUpstream {
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

    fn parse_body(body: &[u8]) -> Result<LookupResult, UpstreamError> {
        let parsed: CepBody =
            serde_json::from_slice(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        if parsed.is_not_found() {
            return Err(UpstreamError::NotFound);
        }
        if parsed.cep.as_deref().unwrap_or_default().is_empty() {
            return Err(UpstreamError::MissingField("cep"));
        }

        Ok(parsed.into())
    }
}

#[async_trait]
impl Upstream for ViaCepUpstream {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn resolve(&self, key: &str) -> Result<LookupResult, UpstreamError> {
        let url = join_url(&self.base_url, &format!("ws/{key}/json/"));

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
