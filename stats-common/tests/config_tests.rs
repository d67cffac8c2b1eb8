//! Tests for configuration resolution and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate DATABASE_URL or PORT are marked with #[serial].

use serial_test::serial;
use stats_common::config::{
    default_database_url, load_toml_config, resolve_database_url, resolve_port, DEFAULT_PORT,
};
use std::env;

#[test]
#[serial]
fn test_cli_database_url_takes_precedence() {
    env::set_var("DATABASE_URL", "sqlite:///tmp/from-env.db");

    let url = resolve_database_url(Some("sqlite:///tmp/from-cli.db"));
    assert_eq!(url, "sqlite:///tmp/from-cli.db");

    env::remove_var("DATABASE_URL");
}

#[test]
#[serial]
fn test_env_database_url_used_without_cli() {
    env::set_var("DATABASE_URL", "sqlite:///tmp/from-env.db");

    let url = resolve_database_url(None);
    assert_eq!(url, "sqlite:///tmp/from-env.db");

    env::remove_var("DATABASE_URL");
}

#[test]
#[serial]
fn test_blank_env_database_url_ignored() {
    env::set_var("DATABASE_URL", "   ");

    let url = resolve_database_url(None);
    assert_ne!(url.trim(), "");

    env::remove_var("DATABASE_URL");
}

#[test]
fn test_default_database_url_under_app_dir() {
    let url = default_database_url();
    assert!(url.contains("stats-admin"), "unexpected default: {}", url);
}

#[test]
#[serial]
fn test_port_from_environment() {
    env::remove_var("FLASK_RUN_PORT");
    env::set_var("PORT", "5123");

    assert_eq!(resolve_port(None).unwrap(), 5123);

    env::remove_var("PORT");
}

#[test]
#[serial]
fn test_port_default_without_environment() {
    env::remove_var("PORT");
    env::remove_var("FLASK_RUN_PORT");

    assert_eq!(resolve_port(None).unwrap(), DEFAULT_PORT);
}

#[test]
fn test_toml_config_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "database_url = \"sqlite:///srv/stats.db\"\n").unwrap();

    let config = load_toml_config(&path).expect("config should parse");
    assert_eq!(config.database_url.as_deref(), Some("sqlite:///srv/stats.db"));
}

#[test]
fn test_malformed_toml_config_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "database_url = [unterminated").unwrap();

    assert!(load_toml_config(&path).is_none());
}

#[test]
fn test_missing_toml_config_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_toml_config(&dir.path().join("absent.toml")).is_none());
}
