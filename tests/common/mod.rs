//! Common test utilities

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// ViaCEP payload for 01001-000
#[allow(dead_code)]
pub const VIACEP_SE: &str = r#"{
  "cep": "01001-000",
  "logradouro": "Praça da Sé",
  "complemento": "lado ímpar",
  "unidade": "",
  "bairro": "Sé",
  "localidade": "São Paulo",
  "uf": "SP",
  "estado": "São Paulo",
  "regiao": "Sudeste",
  "ibge": "3550308",
  "gia": "1004",
  "ddd": "11",
  "siafi": "7107"
}"#;

/// BrasilAPI payload for 01001-000
#[allow(dead_code)]
pub const BRASILAPI_SE: &str = r#"{
  "cep": "01001000",
  "state": "SP",
  "city": "São Paulo",
  "neighborhood": "Sé",
  "street": "Praça da Sé",
  "service": "open-cep"
}"#;

/// Full exchange-rate payload
#[allow(dead_code)]
pub const USDBRL_PAYLOAD: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dólar Americano/Real Brasileiro","high":"5.4363","low":"5.3857","varBid":"0.0231","pctChange":"0.43","bid":"5.4111","ask":"5.4141","timestamp":"1718995193","create_date":"2024-06-21 15:39:53"}}"#;

/// Mount a JSON GET response on `route` with an optional delay
#[allow(dead_code)]
pub async fn mount_json(server: &MockServer, route: &str, status: u16, body: &str, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_raw(body.as_bytes().to_vec(), "application/json")
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}
