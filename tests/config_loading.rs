//! Integration test: Configuration utilities
//!
//! Tests the bin_common path lookup together with session config loading.
//! Nothing here writes process environment variables.

use std::io::Write;
use std::path::PathBuf;
use swan_socket::bin_common::{resolve_config_path, split_config_arg, ConfigType};
use swan_socket::swansocket::{MockTransport, SessionBuilder, SessionConfig};

#[test]
fn test_config_flag_selects_custom_path() {
    let args = vec!["--config".to_string(), "demo/session.yaml".to_string()];
    let (config_type, events) = split_config_arg(args);

    assert!(events.is_empty());
    assert_eq!(
        resolve_config_path(config_type, Some("/etc/swan.yaml".to_string())),
        PathBuf::from("demo/session.yaml")
    );
}

#[test]
fn test_session_path_falls_back_to_default() {
    assert_eq!(
        resolve_config_path(ConfigType::Session, None),
        PathBuf::from("config/swan_socket.yaml")
    );
}

#[test]
fn test_config_fields_to_connection_url() {
    let mut config = SessionConfig::new("wss://game.example.test/socket.io/");
    config.params.insert("token".to_string(), "abc123".to_string());
    config.ping_interval_ms = 750;
    config.validate().unwrap();

    let url = SessionBuilder::from_config(&config)
        .transport(MockTransport::new())
        .connection_url();

    assert_eq!(
        url,
        "wss://game.example.test/socket.io/?EIO=3&transport=websocket&token=abc123"
    );
    assert_eq!(config.ping_interval().as_millis(), 750);
}

#[test]
fn test_yaml_params_reach_connection_url() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "url: wss://game.example.test/socket.io/").unwrap();
    writeln!(file, "params:").unwrap();
    writeln!(file, "  token: abc123").unwrap();

    // url and ping interval may be overridden from the environment; params may not
    let config = SessionConfig::load(file.path()).unwrap();
    assert_eq!(config.params.get("token").map(String::as_str), Some("abc123"));
    assert!(config.connection_url().ends_with("EIO=3&transport=websocket&token=abc123"));
}

#[test]
fn test_invalid_yaml_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "url: [not, a, string").unwrap();

    assert!(SessionConfig::load(file.path()).is_err());
}
