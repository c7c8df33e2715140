// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides store, resources and fixture helpers for both store backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `cdn_config_plane`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use anyhow::Result;
use cdn_config_plane::{
    config::{DatabaseConfig, DatabaseUrl, ServerConfig},
    models::{NewParameter, NewProfile, Parameter, Profile, ProfileType},
    resources::ServerResources,
    store::{open_store, AssociationStore, InMemoryStore, SqliteStore},
};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// In-memory store
pub fn memory_store() -> Arc<dyn AssociationStore> {
    init_test_logging();
    Arc::new(InMemoryStore::new())
}

/// `SQLite` in-memory store
pub async fn sqlite_store() -> Result<Arc<dyn AssociationStore>> {
    init_test_logging();
    Ok(Arc::new(SqliteStore::open(&DatabaseUrl::SqliteMemory, 1).await?))
}

/// Both backends, labelled for assertion messages
pub async fn all_stores() -> Result<Vec<(&'static str, Arc<dyn AssociationStore>)>> {
    Ok(vec![("memory", memory_store()), ("sqlite", sqlite_store().await?)])
}

/// Resources over an in-memory store with default limits
pub fn create_test_resources() -> Arc<ServerResources> {
    create_test_resources_with(ServerConfig::in_memory())
}

/// Resources over an in-memory store with a custom configuration
pub fn create_test_resources_with(config: ServerConfig) -> Arc<ServerResources> {
    Arc::new(ServerResources::new(Arc::new(config), memory_store()))
}

/// Resources over an on-disk `SQLite` database with a multi-connection pool
pub async fn create_sqlite_resources(path: &std::path::Path) -> Result<Arc<ServerResources>> {
    init_test_logging();
    let mut config = ServerConfig::in_memory();
    config.database = DatabaseConfig {
        url: DatabaseUrl::Sqlite {
            path: path.to_path_buf(),
        },
        max_connections: 5,
    };
    let store = open_store(&config.database).await?;
    Ok(Arc::new(ServerResources::new(Arc::new(config), store)))
}

/// Create a profile directly in a store
pub async fn profile(
    store: &Arc<dyn AssociationStore>,
    name: &str,
    profile_type: ProfileType,
) -> Result<Profile> {
    Ok(store.create_profile(&NewProfile::new(name, profile_type)).await?)
}

/// Create a non-secure parameter directly in a store
pub async fn parameter(
    store: &Arc<dyn AssociationStore>,
    name: &str,
    config_file: &str,
    value: &str,
) -> Result<Parameter> {
    Ok(store
        .create_parameter(&NewParameter::new(name, config_file, value))
        .await?)
}
