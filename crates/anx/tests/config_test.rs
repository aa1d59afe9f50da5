//! Configuration defaults, file loading and validation.

use anx::{AnxConfig, DEFAULT_CONFIG};
use std::io::Write;
use std::time::Duration;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_bundled_defaults_match_code_defaults() {
    let bundled: AnxConfig = toml::from_str(DEFAULT_CONFIG).expect("bundled config parses");
    assert_eq!(bundled, AnxConfig::default());
}

#[test]
fn test_defaults() {
    let config = AnxConfig::default();
    assert_eq!(config.target, None);
    assert!(config.rate_limiting);
    assert_eq!(config.concurrency_limit, None);
    assert_eq!(config.chunk_size, 100);
    assert_eq!(config.timeout(), Duration::from_secs(60));
    assert_eq!(*config.rate_limit.rate_limit_read(), 100);
    assert_eq!(*config.rate_limit.rate_limit_write(), 60);
}

#[test]
fn test_from_file_keeps_defaults_for_missing_keys() {
    let file = write_config(
        r#"
        target = "https://api.example.com"
        token = "abc"
        concurrency_limit = 2

        [headers]
        x-team = "ads"

        [rate_limit]
        rate_limit_read = 10
        rate_limit_read_seconds = 5
        "#,
    );

    let config = AnxConfig::from_file(file.path()).expect("load config");

    assert_eq!(config.target.as_deref(), Some("https://api.example.com"));
    assert_eq!(config.token.as_deref(), Some("abc"));
    assert_eq!(config.concurrency_limit, Some(2));
    assert_eq!(config.headers.get("x-team").map(String::as_str), Some("ads"));
    assert_eq!(*config.rate_limit.rate_limit_read(), 10);
    assert_eq!(*config.rate_limit.rate_limit_read_seconds(), 5);
    assert_eq!(*config.rate_limit.rate_limit_write(), 60);
    assert!(config.rate_limiting);
    assert_eq!(config.timeout_ms, 60_000);
}

#[test]
fn test_from_file_rejects_zero_limit() {
    let file = write_config(
        r#"
        [rate_limit]
        rate_limit_write = 0
        "#,
    );
    assert!(AnxConfig::from_file(file.path()).is_err());
}

#[test]
fn test_from_file_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(AnxConfig::from_file(dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_validate_rejects_unusable_values() {
    let zero_timeout = AnxConfig {
        timeout_ms: 0,
        ..AnxConfig::default()
    };
    assert!(zero_timeout.validate().is_err());

    let zero_concurrency = AnxConfig {
        concurrency_limit: Some(0),
        ..AnxConfig::default()
    };
    assert!(zero_concurrency.validate().is_err());

    let relative_target = AnxConfig {
        target: Some("api.example.com/v1".to_string()),
        ..AnxConfig::default()
    };
    assert!(relative_target.validate().is_err());

    assert!(AnxConfig::default().validate().is_ok());
}
