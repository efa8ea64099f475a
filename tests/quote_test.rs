//! Integration tests for the quote fetcher, server and client

mod common;

use cepquote::client::{ClientError, QuoteClient};
use cepquote::config::ServerConfig;
use cepquote::quote::{QuoteFetcher, QuoteResponse};
use cepquote::server::QuoteServer;
use cepquote::storage::QuoteStore;
use cepquote::utils::error::FetchError;
use common::{mount_json, USDBRL_PAYLOAD};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use wiremock::MockServer;

const QUOTE_PATH: &str = "/json/last/USD-BRL";

async fn fetcher_for(server: &MockServer) -> QuoteFetcher {
    QuoteFetcher::with_url(&format!("{}{QUOTE_PATH}", server.uri()), Duration::from_secs(2))
        .unwrap()
}

// ============================================================================
// Fetcher
// ============================================================================

#[tokio::test]
async fn test_fetch_full_payload() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, USDBRL_PAYLOAD, 0).await;

    let rate = fetcher_for(&upstream).await.fetch().await.unwrap();
    assert_eq!(rate.bid(), "5.4111");
    assert_eq!(rate.usdbrl.ask, "5.4141");
}

#[tokio::test]
async fn test_fetch_partial_payload_uses_fallback_parse() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, r#"{"USDBRL":{"bid":"5.1234"}}"#, 0).await;

    let rate = fetcher_for(&upstream).await.fetch().await.unwrap();
    assert_eq!(rate.bid(), "5.1234");
}

#[tokio::test]
async fn test_fetch_rate_limited_is_an_error() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 429, r#"{"status":429}"#, 0).await;

    let err = fetcher_for(&upstream).await.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::RateLimit));
}

#[tokio::test]
async fn test_fetch_server_error() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 503, "", 0).await;

    let err = fetcher_for(&upstream).await.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::ServerError(503)));
}

#[tokio::test]
async fn test_fetch_empty_bid() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, r#"{"USDBRL":{"bid":""}}"#, 0).await;

    let err = fetcher_for(&upstream).await.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::EmptyBid));
}

#[tokio::test]
async fn test_fetch_non_json() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, "<html>maintenance</html>", 0).await;

    let err = fetcher_for(&upstream).await.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, USDBRL_PAYLOAD, 500).await;

    let fetcher = QuoteFetcher::with_url(
        &format!("{}{QUOTE_PATH}", upstream.uri()),
        Duration::from_millis(100),
    )
    .unwrap();

    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout));
}

// ============================================================================
// Server
// ============================================================================

struct RunningServer {
    base_url: String,
    store: QuoteStore,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl RunningServer {
    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

async fn start_server(upstream: &MockServer, store: QuoteStore) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig {
        bind_address: addr,
        enable_request_logging: false,
        ..ServerConfig::default()
    };
    let server = QuoteServer::with_components(config, fetcher_for(upstream).await, store.clone());

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        server
            .serve(listener, async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    RunningServer {
        base_url: format!("http://{addr}"),
        store,
        shutdown: Some(tx),
        handle,
    }
}

#[tokio::test]
async fn test_server_serves_and_persists_quote() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, USDBRL_PAYLOAD, 0).await;

    let running = start_server(&upstream, QuoteStore::in_memory().unwrap()).await;

    let response = reqwest::get(format!("{}/cotacao", running.base_url))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "bid": "5.4111" }));

    assert_eq!(running.store.count().unwrap(), 1);
    assert_eq!(running.store.recent(1).unwrap()[0].bid, "5.4111");

    running.stop().await;
}

#[tokio::test]
async fn test_server_upstream_failure_returns_500() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 429, "", 0).await;

    let running = start_server(&upstream, QuoteStore::in_memory().unwrap()).await;

    let response = reqwest::get(format!("{}/cotacao", running.base_url))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(running.store.count().unwrap(), 0);

    running.stop().await;
}

#[tokio::test]
async fn test_server_storage_failure_still_answers() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, USDBRL_PAYLOAD, 0).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cotacao.db");
    let store = QuoteStore::open(&db_path, Duration::from_secs(1)).unwrap();

    // Break the schema behind the store's back.
    rusqlite::Connection::open(&db_path)
        .unwrap()
        .execute_batch("DROP TABLE cotacoes;")
        .unwrap();

    let running = start_server(&upstream, store).await;

    let response = reqwest::get(format!("{}/cotacao", running.base_url))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let quote: QuoteResponse = response.json().await.unwrap();
    assert_eq!(quote.bid, "5.4111");

    running.stop().await;
}

#[tokio::test]
async fn test_server_history_and_health() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, USDBRL_PAYLOAD, 0).await;

    let running = start_server(&upstream, QuoteStore::in_memory().unwrap()).await;
    let http = reqwest::Client::new();

    for _ in 0..3 {
        let status = http
            .get(format!("{}/cotacao", running.base_url))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, 200);
    }

    let history: serde_json::Value = http
        .get(format!("{}/cotacao/history?limit=2", running.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["quotes"].as_array().unwrap().len(), 2);
    assert_eq!(history["quotes"][0]["bid"], "5.4111");

    let health: serde_json::Value = http
        .get(format!("{}/health", running.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    drop(http);
    running.stop().await;
}

#[tokio::test]
async fn test_server_history_limit_is_clamped() {
    let upstream = MockServer::start().await;
    let store = QuoteStore::in_memory().unwrap();
    for i in 0..120 {
        store.save(&format!("5.{i:03}")).await.unwrap();
    }

    let running = start_server(&upstream, store).await;
    let http = reqwest::Client::new();

    for (query, expected) in [("", 10), ("?limit=0", 1), ("?limit=500", 100), ("?limit=37", 37)] {
        let history: serde_json::Value = http
            .get(format!("{}/cotacao/history{query}", running.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let quotes = history["quotes"].as_array().unwrap();
        assert_eq!(quotes.len(), expected, "query: {query:?}");
        assert_eq!(quotes[0]["bid"], "5.119");
    }

    assert_eq!(running.store.count().unwrap(), 120);

    drop(http);
    running.stop().await;
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test]
async fn test_client_writes_quote_file() {
    let server = MockServer::start().await;
    mount_json(&server, "/cotacao", 200, r#"{"bid":"5.4111"}"#, 0).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cotacao.txt");
    let client = QuoteClient::with_target(&server.uri(), Duration::from_millis(300), &output)
        .unwrap();

    let bid = client.run().await.unwrap();

    assert_eq!(bid, "5.4111");
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "Dólar: 5.4111");
}

#[tokio::test]
async fn test_client_timeout_leaves_no_file() {
    let server = MockServer::start().await;
    mount_json(&server, "/cotacao", 200, r#"{"bid":"5.4111"}"#, 600).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cotacao.txt");
    let client = QuoteClient::with_target(&server.uri(), Duration::from_millis(100), &output)
        .unwrap();

    let err = client.run().await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_client_rejects_error_status_and_empty_bid() {
    let server = MockServer::start().await;
    mount_json(&server, "/cotacao", 500, r#"{"error":"boom"}"#, 0).await;

    let dir = TempDir::new().unwrap();
    let client = QuoteClient::with_target(
        &server.uri(),
        Duration::from_millis(300),
        dir.path().join("a.txt"),
    )
    .unwrap();
    assert!(matches!(
        client.fetch_bid().await.unwrap_err(),
        ClientError::Status(500)
    ));

    let server = MockServer::start().await;
    mount_json(&server, "/cotacao", 200, r#"{"bid":""}"#, 0).await;

    let client = QuoteClient::with_target(
        &server.uri(),
        Duration::from_millis(300),
        dir.path().join("b.txt"),
    )
    .unwrap();
    assert!(matches!(
        client.fetch_bid().await.unwrap_err(),
        ClientError::EmptyBid
    ));
}

#[tokio::test]
async fn test_client_against_real_server() {
    let upstream = MockServer::start().await;
    mount_json(&upstream, QUOTE_PATH, 200, USDBRL_PAYLOAD, 0).await;
    let running = start_server(&upstream, QuoteStore::in_memory().unwrap()).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cotacao.txt");
    let client = QuoteClient::with_target(&running.base_url, Duration::from_secs(2), &output)
        .unwrap();

    client.run().await.unwrap();
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "Dólar: 5.4111");
    assert_eq!(running.store.count().unwrap(), 1);

    drop(client);
    running.stop().await;
}
