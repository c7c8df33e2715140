// ABOUTME: Tests for environment-driven server configuration loading and validation
// ABOUTME: Runs serially because every test mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use cdn_config_plane::config::{DatabaseUrl, Environment, LogLevel, ServerConfig};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const VARS: &[&str] = &[
    "LOG_LEVEL",
    "RUST_LOG",
    "ENVIRONMENT",
    "HOST",
    "HTTP_PORT",
    "REQUEST_TIMEOUT_SECS",
    "MAX_BODY_BYTES",
    "REQUEST_ID_HEADER",
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "SNAPSHOT_CACHE_CAPACITY",
    "SNAPSHOT_PREWARM",
    "DEFAULT_PAGE_LIMIT",
    "MAX_PAGE_LIMIT",
    "MAX_BATCH_SIZE",
    "EXPOSE_SECURE_VALUES",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.api.default_page_limit <= config.api.max_page_limit);
    assert!(config.api.max_batch_size >= 1);
    assert!(!config.api.expose_secure_values);
    assert!(!config.snapshot.prewarm);
    assert_eq!(config.http.request_id_header, "x-request-id");
}

#[test]
#[serial]
fn test_overrides_from_environment() {
    clear_env();
    env::set_var("HTTP_PORT", "9191");
    env::set_var("DATABASE_URL", "memory");
    env::set_var("MAX_BATCH_SIZE", "25");
    env::set_var("SNAPSHOT_PREWARM", "true");
    env::set_var("EXPOSE_SECURE_VALUES", "true");
    env::set_var("LOG_LEVEL", "debug");
    env::set_var("ENVIRONMENT", "production");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.http.port, 9191);
    assert_eq!(config.database.url, DatabaseUrl::Memory);
    assert_eq!(config.api.max_batch_size, 25);
    assert!(config.snapshot.prewarm);
    assert!(config.api.expose_secure_values);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.environment.is_production());
}

#[test]
#[serial]
fn test_sqlite_file_url() {
    clear_env();
    env::set_var("DATABASE_URL", "sqlite:./data/cdn.db");
    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(
        config.database.url,
        DatabaseUrl::Sqlite {
            path: PathBuf::from("./data/cdn.db")
        }
    );
    assert!(!config.database.url.is_ephemeral());
}

#[test]
#[serial]
fn test_unparseable_values_are_errors() {
    for (var, value) in [
        ("HTTP_PORT", "eighty"),
        ("MAX_BATCH_SIZE", "-1"),
        ("SNAPSHOT_PREWARM", "maybe"),
        ("DATABASE_URL", "postgres://localhost/cdn"),
    ] {
        clear_env();
        env::set_var(var, value);
        let error = ServerConfig::from_env().unwrap_err();
        assert!(error.to_string().contains(var), "{var}: {error}");
    }
    clear_env();
}

#[test]
#[serial]
fn test_inconsistent_limits_are_rejected() {
    clear_env();
    env::set_var("DEFAULT_PAGE_LIMIT", "500");
    env::set_var("MAX_PAGE_LIMIT", "100");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("MAX_BATCH_SIZE", "0");
    assert!(ServerConfig::from_env().is_err());
    clear_env();
}

#[test]
fn test_in_memory_config_is_valid_and_ephemeral() {
    let config = ServerConfig::in_memory();
    config.validate().unwrap();
    assert_eq!(config.environment, Environment::Testing);
    assert!(config.database.url.is_ephemeral());
    assert!(config.summary().contains("memory"));
}

#[test]
#[serial]
fn test_request_id_header_from_environment() {
    clear_env();
    env::set_var("REQUEST_ID_HEADER", "X-Correlation-Id");
    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http.request_id_header, "x-correlation-id");
    assert_eq!(config.http.request_id_header_name().as_str(), "x-correlation-id");

    env::set_var("REQUEST_ID_HEADER", "not a header");
    let error = ServerConfig::from_env().unwrap_err();
    assert!(error.to_string().contains("REQUEST_ID_HEADER"), "{error}");
    clear_env();
}
