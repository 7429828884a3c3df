//! Integration tests for configuration loading

use mqtt_session::config::{ConfigError, QosLevel, SessionConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
broker_host = "broker.example.net"
port = 8883
client_id = "console-main"
keepalive_secs = 30
default_qos = 1
disconnect_timeout_secs = 10
"#,
    );

    let config = SessionConfig::load_from_file(file.path()).expect("config loads");
    assert_eq!(config.broker_host, "broker.example.net");
    assert_eq!(config.port, 8883);
    assert_eq!(config.client_id.as_deref(), Some("console-main"));
    assert_eq!(config.keepalive_secs, 30);
    assert_eq!(config.default_qos, QosLevel::AtLeastOnce);
    assert_eq!(config.disconnect_timeout_secs, 10);
}

#[test]
fn test_load_minimal_config_applies_defaults() {
    let file = write_config(r#"broker_host = "localhost""#);

    let config = SessionConfig::load_from_file(file.path()).expect("config loads");
    assert_eq!(config.port, 1883);
    assert_eq!(config.keepalive_secs, 60);
    assert_eq!(config.default_qos, QosLevel::AtMostOnce);
    assert_eq!(config.disconnect_timeout_secs, 5);
    assert!(config.client_id.is_none());
}

#[test]
fn test_missing_host_is_a_parse_error() {
    let file = write_config("port = 1883");
    let result = SessionConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_invalid_toml_rejected() {
    let file = write_config("broker_host = [not toml");
    let result = SessionConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_url_shaped_host_rejected_on_load() {
    let file = write_config(r#"broker_host = "mqtt://localhost""#);
    let result = SessionConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidBrokerAddress(_))));
}

#[test]
fn test_out_of_range_qos_rejected_on_load() {
    let file = write_config("broker_host = \"h\"\ndefault_qos = 9");
    let result = SessionConfig::load_from_file(file.path());
    assert!(result.is_err());
}

#[test]
fn test_missing_file_is_io_error() {
    let result = SessionConfig::load_from_file(std::path::Path::new("/nonexistent/session.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}
