//! Configuration loading tests: YAML file, environment, CLI overrides

use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use sensorbio_mcp::cli::Cli;
use sensorbio_mcp::config::{Config, DEFAULT_BASE_URL};

const ENV_VARS: &[&str] = &[
    "SENSR_BASE_URL",
    "SENSR_TOKEN_URL",
    "SENSR_TIMEOUT_SECONDS",
    "SENSR_TZ",
];

fn clear_env() {
    for key in ENV_VARS {
        std::env::remove_var(key);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
#[serial]
fn test_load_from_yaml_file() {
    clear_env();
    let file = write_config(
        r#"
api:
  base_url: "http://localhost:9000"
  timeout_seconds: 10
tools:
  timezone: "Europe/Berlin"
server:
  name: "sensr-dev"
"#,
    );

    let config = Config::load(file.path().to_str(), &Cli::default()).expect("config");
    assert_eq!(config.api.base_url, "http://localhost:9000");
    assert_eq!(config.api.timeout_seconds, 10);
    assert_eq!(config.tools.timezone, "Europe/Berlin");
    assert_eq!(config.server.name, "sensr-dev");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();
    let config =
        Config::load(Some("/nonexistent/sensorbio.yaml"), &Cli::default()).expect("config");
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_invalid_yaml_is_error() {
    clear_env();
    let file = write_config("api: [unclosed");
    let err = Config::load(file.path().to_str(), &Cli::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = write_config("api:\n  timeout_seconds: 10\n");
    std::env::set_var("SENSR_TIMEOUT_SECONDS", "3");
    std::env::set_var("SENSR_TZ", "UTC");
    std::env::set_var("SENSR_TOKEN_URL", "http://localhost:9001/token");

    let config = Config::load(file.path().to_str(), &Cli::default()).expect("config");
    clear_env();

    assert_eq!(config.api.timeout_seconds, 3);
    assert_eq!(config.tools.timezone, "UTC");
    assert_eq!(config.api.token_url, "http://localhost:9001/token");
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
}

#[test]
#[serial]
fn test_invalid_timeout_env_is_ignored() {
    clear_env();
    std::env::set_var("SENSR_TIMEOUT_SECONDS", "soon");
    let config = Config::load(None, &Cli::default()).expect("config");
    clear_env();
    assert_eq!(config.api.timeout_seconds, 30);
}

#[test]
#[serial]
fn test_cli_override_beats_env() {
    clear_env();
    std::env::set_var("SENSR_BASE_URL", "http://from-env");
    let cli = Cli {
        base_url: Some("http://from-cli".to_string()),
        ..Default::default()
    };
    let config = Config::load(None, &cli).expect("config");
    clear_env();
    assert_eq!(config.api.base_url, "http://from-cli");
}

#[test]
#[serial]
fn test_unknown_timezone_from_env_fails_validation() {
    clear_env();
    std::env::set_var("SENSR_TZ", "Nowhere/Special");
    let config = Config::load(None, &Cli::default()).expect("config");
    clear_env();
    assert!(config.validate().is_err());
}
