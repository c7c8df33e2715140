// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, database URLs, limits, and snapshot cache sizing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use crate::constants::{cache, defaults, limits, ports};
use anyhow::{bail, Context, Result};
use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Where associations are persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// Process-local arena store, nothing persisted
    Memory,
    /// `SQLite` living in memory (schema and SQL paths exercised, nothing persisted)
    SqliteMemory,
    /// `SQLite` database file
    Sqlite {
        /// Path to the database file
        path: PathBuf,
    },
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error for an empty value or an unsupported scheme
    pub fn parse_url(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("DATABASE_URL must not be empty");
        }
        if s.eq_ignore_ascii_case("memory") {
            return Ok(Self::Memory);
        }
        if let Some(rest) = s.strip_prefix("sqlite:") {
            let path_str = rest.trim_start_matches("//");
            if path_str == ":memory:" {
                return Ok(Self::SqliteMemory);
            }
            if path_str.is_empty() {
                bail!("DATABASE_URL '{s}' has no database path");
            }
            return Ok(Self::Sqlite {
                path: PathBuf::from(path_str),
            });
        }
        if s.contains("://") {
            bail!("unsupported DATABASE_URL scheme in '{s}'");
        }
        // Bare value: treat as SQLite file path
        Ok(Self::Sqlite {
            path: PathBuf::from(s),
        })
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::Memory => "memory".into(),
            Self::SqliteMemory => "sqlite::memory:".into(),
            Self::Sqlite { path } => format!("sqlite:{}", path.display()),
        }
    }

    /// Check if nothing is persisted across restarts
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Memory | Self::SqliteMemory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::parse_url(defaults::DEFAULT_DATABASE_URL).unwrap_or(Self::Memory)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Store backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend selection
    pub url: DatabaseUrl,
    /// `SQLite` pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DatabaseUrl::default(),
            max_connections: limits::DEFAULT_DATABASE_MAX_CONNECTIONS,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Request body limit
    pub max_body_bytes: usize,
    /// Header that carries, and echoes back, the request correlation id
    pub request_id_header: String,
}

impl HttpConfig {
    /// Parsed request id header, falling back to `x-request-id`
    #[must_use]
    pub fn request_id_header_name(&self) -> HeaderName {
        HeaderName::try_from(self.request_id_header.as_str())
            .unwrap_or_else(|_| HeaderName::from_static(defaults::DEFAULT_REQUEST_ID_HEADER))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_owned(),
            port: ports::DEFAULT_HTTP_PORT,
            request_timeout_secs: limits::DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_bytes: limits::DEFAULT_MAX_BODY_BYTES,
            request_id_header: defaults::DEFAULT_REQUEST_ID_HEADER.to_owned(),
        }
    }
}

/// Snapshot publisher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Maximum number of cached profile snapshots
    pub cache_capacity: usize,
    /// Compute every profile's snapshot at start-up
    pub prewarm: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            cache_capacity: cache::DEFAULT_SNAPSHOT_CACHE_CAPACITY,
            prewarm: false,
        }
    }
}

/// API behaviour limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Page size when the client sends no `limit`
    pub default_page_limit: usize,
    /// Largest page a client may request
    pub max_page_limit: usize,
    /// Largest batch accepted by batch create
    pub max_batch_size: usize,
    /// Return secure parameter values unmasked in listings
    pub expose_secure_values: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_page_limit: limits::DEFAULT_PAGE_LIMIT,
            max_page_limit: limits::MAX_PAGE_LIMIT,
            max_batch_size: limits::MAX_BATCH_SIZE,
            expose_secure_values: false,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Log level
    pub log_level: LogLevel,
    /// HTTP listener
    pub http: HttpConfig,
    /// Store backend
    pub database: DatabaseConfig,
    /// Snapshot publisher
    pub snapshot: SnapshotConfig,
    /// API limits
    pub api: ApiConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but cannot be parsed, or if the
    /// resulting limits are inconsistent
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let log_level = env::var("LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .map(|level| LogLevel::from_str_or_default(&level))
            .unwrap_or_default();

        let database_url = env_var_or("DATABASE_URL", defaults::DEFAULT_DATABASE_URL);

        let config = Self {
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            log_level,
            http: HttpConfig {
                host: env_var_or("HOST", defaults::DEFAULT_HOST),
                port: parse_env("HTTP_PORT", ports::DEFAULT_HTTP_PORT)?,
                request_timeout_secs: parse_env(
                    "REQUEST_TIMEOUT_SECS",
                    limits::DEFAULT_REQUEST_TIMEOUT_SECS,
                )?,
                max_body_bytes: parse_env("MAX_BODY_BYTES", limits::DEFAULT_MAX_BODY_BYTES)?,
                request_id_header: env_var_or(
                    "REQUEST_ID_HEADER",
                    defaults::DEFAULT_REQUEST_ID_HEADER,
                )
                .to_ascii_lowercase(),
            },
            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&database_url)
                    .with_context(|| format!("Invalid DATABASE_URL value '{database_url}'"))?,
                max_connections: parse_env(
                    "DATABASE_MAX_CONNECTIONS",
                    limits::DEFAULT_DATABASE_MAX_CONNECTIONS,
                )?,
            },
            snapshot: SnapshotConfig {
                cache_capacity: parse_env(
                    "SNAPSHOT_CACHE_CAPACITY",
                    cache::DEFAULT_SNAPSHOT_CACHE_CAPACITY,
                )?,
                prewarm: parse_env("SNAPSHOT_PREWARM", false)?,
            },
            api: ApiConfig {
                default_page_limit: parse_env("DEFAULT_PAGE_LIMIT", limits::DEFAULT_PAGE_LIMIT)?,
                max_page_limit: parse_env("MAX_PAGE_LIMIT", limits::MAX_PAGE_LIMIT)?,
                max_batch_size: parse_env("MAX_BATCH_SIZE", limits::MAX_BATCH_SIZE)?,
                expose_secure_values: parse_env("EXPOSE_SECURE_VALUES", false)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests and embedding: in-memory store, default limits
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            environment: Environment::Testing,
            database: DatabaseConfig {
                url: DatabaseUrl::Memory,
                ..DatabaseConfig::default()
            },
            ..Self::default()
        }
    }

    /// Check cross-field consistency
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is zero, the default page exceeds the maximum, or
    /// the request id header is not a valid header name
    pub fn validate(&self) -> Result<()> {
        if self.api.default_page_limit == 0 || self.api.max_page_limit == 0 {
            bail!("page limits must be at least 1");
        }
        if self.api.default_page_limit > self.api.max_page_limit {
            bail!(
                "DEFAULT_PAGE_LIMIT ({}) exceeds MAX_PAGE_LIMIT ({})",
                self.api.default_page_limit,
                self.api.max_page_limit
            );
        }
        if self.api.max_batch_size == 0 {
            bail!("MAX_BATCH_SIZE must be at least 1");
        }
        if self.database.max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        if self.http.request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }
        if HeaderName::try_from(self.http.request_id_header.as_str()).is_err() {
            bail!(
                "REQUEST_ID_HEADER '{}' is not a valid header name",
                self.http.request_id_header
            );
        }
        Ok(())
    }

    /// Human-readable configuration summary for start-up logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "CDN Config Server Configuration:\n\
             - Environment: {}\n\
             - Listen: {}:{}\n\
             - Request Id Header: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - Snapshot Cache: {} entries (prewarm: {})\n\
             - Page Limit: {} (max {})\n\
             - Max Batch Size: {}\n\
             - Secure Values: {}",
            self.environment,
            self.http.host,
            self.http.port,
            self.http.request_id_header,
            self.log_level,
            self.database.url,
            self.snapshot.cache_capacity,
            self.snapshot.prewarm,
            self.api.default_page_limit,
            self.api.max_page_limit,
            self.api.max_batch_size,
            if self.api.expose_secure_values {
                "Exposed"
            } else {
                "Masked"
            },
        )
    }
}

/// Read an environment variable, falling back to a default
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an optional environment variable into `T`
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {key} value '{raw}'")),
        Err(_) => Ok(default),
    }
}
