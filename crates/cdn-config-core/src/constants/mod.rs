// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for routes, limits, snapshot caching, and service identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! This module organizes application constants by domain for better maintainability.

/// Snapshot cache constants (capacity, timestamp formats)
pub mod cache;

/// API endpoints
pub mod endpoints {
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// Readiness endpoint
    pub const READY_CHECK: &str = "/ready";
    /// Versioned API base path
    pub const API_BASE: &str = "/api/3.0";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// Default limits
pub mod limits {
    /// Default page size for association listings
    pub const DEFAULT_PAGE_LIMIT: usize = 100;
    /// Hard upper bound for a single page
    pub const MAX_PAGE_LIMIT: usize = 1_000;
    /// Maximum number of pairs accepted in one batch create
    pub const MAX_BATCH_SIZE: usize = 1_000;
    /// Default request timeout in seconds
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Default request body limit in bytes
    pub const DEFAULT_MAX_BODY_BYTES: usize = 1_048_576;
    /// Default SQLite pool size
    pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
    /// How long a `SQLite` connection waits on a locked database before failing
    pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 10;
}

/// Defaults for string-valued settings
pub mod defaults {
    /// Default database location
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/cdn_config.db";
    /// Default bind host
    pub const DEFAULT_HOST: &str = "127.0.0.1";
    /// Header carrying the request correlation id
    pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";
    /// Replacement text for secure parameter values in listings
    pub const SECURE_VALUE_MASK: &str = "********";
}

/// Service identity used in logs
pub mod service_names {
    /// Service name for structured logging
    pub const CDN_CONFIG_SERVER: &str = "cdn-config-server";
}
