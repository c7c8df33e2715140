// ABOUTME: Configuration module for environment-driven server settings
// ABOUTME: Re-exports ServerConfig and the typed sub-configurations it is assembled from
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration management
//!
//! All settings come from environment variables; the binary may override a few of
//! them with command line flags.

/// Environment variable parsing and typed configuration structs
pub mod environment;

pub use environment::{
    ApiConfig, DatabaseConfig, DatabaseUrl, Environment, HttpConfig, LogLevel, ServerConfig,
    SnapshotConfig,
};
