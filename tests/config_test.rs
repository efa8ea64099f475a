//! Tests for config module

use cepquote::config::Config;
use serial_test::serial;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_config_file_exists() {
    let config_path = Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
fn test_project_config_loads_and_validates() {
    let config = Config::from_file(Path::new("config.toml")).expect("config.toml should parse");

    assert!(config.validate().is_ok());
    assert_eq!(config.lookup.race_timeout(), Duration::from_secs(1));
    assert_eq!(config.server.bind_address.port(), 8080);
    assert_eq!(config.client.output_path, Path::new("cotacao.txt"));
}

#[test]
fn test_partial_file_uses_defaults() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"
[lookup]
race_timeout_ms = 2500

[client]
server_url = "http://quotes.internal:9000"
"#,
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.lookup.race_timeout_ms, 2500);
    assert_eq!(config.lookup.request_timeout_ms, 900);
    assert_eq!(config.client.server_url, "http://quotes.internal:9000");
    assert_eq!(config.client.timeout_ms, 300);
    assert_eq!(config.database.write_timeout_ms, 100);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_toml_is_reported() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "[lookup\nrace_timeout_ms = ").unwrap();

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_missing_file_is_reported() {
    let err = Config::from_file(Path::new("does/not/exist.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
#[serial]
fn test_env_overrides() {
    std::env::set_var("CEPQUOTE_RACE_TIMEOUT_MS", "1500");
    std::env::set_var("CEPQUOTE_VIACEP_URL", "http://127.0.0.1:9999");
    std::env::set_var("CEPQUOTE_BIND_ADDRESS", "0.0.0.0:9090");

    let config = Config::from_env().unwrap();

    std::env::remove_var("CEPQUOTE_RACE_TIMEOUT_MS");
    std::env::remove_var("CEPQUOTE_VIACEP_URL");
    std::env::remove_var("CEPQUOTE_BIND_ADDRESS");

    assert_eq!(config.lookup.race_timeout_ms, 1500);
    assert_eq!(config.lookup.viacep_url, "http://127.0.0.1:9999");
    assert_eq!(config.server.bind_address.port(), 9090);
}

#[test]
#[serial]
fn test_unparsable_env_values_are_ignored() {
    std::env::set_var("CEPQUOTE_CLIENT_TIMEOUT_MS", "soon");

    let config = Config::from_env().unwrap();

    std::env::remove_var("CEPQUOTE_CLIENT_TIMEOUT_MS");

    assert_eq!(config.client.timeout_ms, 300);
}
