use std::collections::HashMap;
use std::time::Duration;

use shortlink::config::{Config, ConfigError};

fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    Config::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn test_defaults_when_nothing_is_set() {
    let config = config_from(&[]).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.port, 8001);
    assert_eq!(config.database_url, "short-url.db");
    assert_eq!(config.public_url, "http://localhost:8001");
    assert_eq!(config.store_timeout, Duration::from_millis(5000));
    assert_eq!(config.id_length, 8);
}

#[test]
fn test_explicit_values() {
    let config = config_from(&[
        ("PORT", "9000"),
        ("DATABASE_URL", "/tmp/links.db"),
        ("PUBLIC_URL", "https://sho.rt/"),
        ("STORE_TIMEOUT_MS", "250"),
        ("ID_LENGTH", "12"),
    ])
    .unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(config.database_url, "/tmp/links.db");
    assert_eq!(config.public_url, "https://sho.rt");
    assert_eq!(config.store_timeout, Duration::from_millis(250));
    assert_eq!(config.id_length, 12);
}

#[test]
fn test_public_url_follows_port() {
    let config = config_from(&[("PORT", "3000")]).unwrap();
    assert_eq!(config.public_url, "http://localhost:3000");
}

#[test]
fn test_empty_values_are_unset() {
    let config = config_from(&[("PORT", ""), ("DATABASE_URL", "  ")]).unwrap();

    assert_eq!(config.port, 8001);
    assert_eq!(config.database_url, "short-url.db");
}

#[test]
fn test_invalid_port() {
    let err = config_from(&[("PORT", "eighty")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
}

#[test]
fn test_zero_timeout_rejected() {
    let err = config_from(&[("STORE_TIMEOUT_MS", "0")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "STORE_TIMEOUT_MS", .. }));
}

#[test]
fn test_id_length_out_of_range() {
    for value in ["3", "33"] {
        let err = config_from(&[("ID_LENGTH", value)]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ID_LENGTH", .. }));
    }
}
