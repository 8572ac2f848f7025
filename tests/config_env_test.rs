//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Note that Config::from_env() also loads
//! from .env file via dotenvy, so these tests focus on override behavior.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use mcp_research_crew::config::{Config, LogFormat};
use serial_test::serial;
use std::env;

fn with_api_key() {
    env::set_var("LANGBASE_API_KEY", "test-key");
}

#[test]
#[serial]
fn test_config_from_env_loads_successfully() {
    with_api_key();

    let result = Config::from_env();
    assert!(result.is_ok(), "Config::from_env() should succeed with the API key set");
}

#[test]
#[serial]
fn test_config_from_env_custom_base_url() {
    with_api_key();
    env::set_var("LANGBASE_BASE_URL", "https://custom.api.com");

    let config = Config::from_env().unwrap();
    assert_eq!(config.langbase.base_url, "https://custom.api.com");

    // Restore default
    env::set_var("LANGBASE_BASE_URL", "https://api.langbase.com");
}

#[test]
#[serial]
fn test_config_from_env_custom_database() {
    with_api_key();
    env::set_var("DATABASE_PATH", "/custom/path.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/path.db");
    assert_eq!(config.database.max_connections, 10);

    // Restore defaults
    env::set_var("DATABASE_PATH", "./data/research.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "5");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    with_api_key();
    env::set_var("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    // Restore default
    env::set_var("LOG_FORMAT", "pretty");
}

#[test]
#[serial]
fn test_config_from_env_custom_request() {
    with_api_key();
    env::set_var("REQUEST_TIMEOUT_MS", "30000");
    env::set_var("MAX_RETRIES", "5");
    env::set_var("RETRY_DELAY_MS", "2000");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, 30000);
    assert_eq!(config.request.max_retries, 5);
    assert_eq!(config.request.retry_delay_ms, 2000);

    // Restore defaults
    env::set_var("REQUEST_TIMEOUT_MS", "60000");
    env::set_var("MAX_RETRIES", "3");
    env::set_var("RETRY_DELAY_MS", "1000");
}

#[test]
#[serial]
fn test_config_from_env_custom_role_pipes() {
    with_api_key();
    env::set_var("PIPE_COORDINATOR", "coord-custom");
    env::set_var("PIPE_WRITER", "writer-custom");

    let config = Config::from_env().unwrap();
    assert_eq!(config.pipes.coordinator, "coord-custom");
    assert_eq!(config.pipes.writer, "writer-custom");
    // untouched roles keep their defaults
    assert_eq!(config.pipes.researcher, "research-retrieval-v1");
    assert_eq!(config.pipes.analyst, "research-analyst-v1");

    // Restore defaults
    env::set_var("PIPE_COORDINATOR", "research-coordinator-v1");
    env::set_var("PIPE_WRITER", "research-writer-v1");
}

#[test]
#[serial]
fn test_config_from_env_custom_quality() {
    with_api_key();
    env::set_var("QUALITY_THRESHOLD", "0.8");
    env::set_var("QUALITY_MAX_RETRIES", "4");

    let config = Config::from_env().unwrap();
    assert_eq!(config.quality.threshold, 0.8);
    assert_eq!(config.quality.max_retries, 4);

    // Restore defaults
    env::set_var("QUALITY_THRESHOLD", "0.65");
    env::set_var("QUALITY_MAX_RETRIES", "2");
}

#[test]
#[serial]
fn test_config_from_env_quality_defaults() {
    with_api_key();
    env::remove_var("QUALITY_THRESHOLD");
    env::remove_var("QUALITY_MAX_RETRIES");

    let config = Config::from_env().unwrap();
    assert_eq!(config.quality.threshold, 0.65);
    assert_eq!(config.quality.max_retries, 2);
}

#[test]
#[serial]
fn test_config_from_env_invalid_numbers_fall_back() {
    with_api_key();
    env::set_var("QUALITY_MAX_RETRIES", "not-a-number");

    let config = Config::from_env().unwrap();
    assert_eq!(config.quality.max_retries, 2);

    env::remove_var("QUALITY_MAX_RETRIES");
}
