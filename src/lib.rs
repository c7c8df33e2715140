// ABOUTME: Main library entry point for the CDN profile/parameter configuration plane
// ABOUTME: Provides the association store, mutation coordinator, resolver, snapshots and HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![deny(unsafe_code)]

//! # CDN Config Plane
//!
//! Control plane for content-delivery-network cache configuration. **Profiles** are
//! named configuration templates, **Parameters** are single directives bound to a
//! config file, and the many-to-many **Profile Parameter** association joins them.
//! Every server assigned to a profile receives that profile's resolution: its
//! parameters, deduplicated and ordered by config file and name.
//!
//! ## Architecture
//!
//! - **Store**: `AssociationStore` trait with in-memory and `SQLite` backends
//! - **Coordinator**: validates and applies mutations as all-or-nothing batches
//! - **Resolver**: computes the ordered parameter set of a profile
//! - **Snapshot**: versioned, immutable resolutions with monotonic `LastModified`
//! - **Query**: filtered, paginated and conditional reads
//! - **Routes / Server**: the `/api/3.0` HTTP surface
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cdn_config_plane::config::ServerConfig;
//! use cdn_config_plane::models::{NewProfile, ProfileType};
//! use cdn_config_plane::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resources = ServerResources::from_config(ServerConfig::in_memory()).await?;
//!     let profile = resources
//!         .coordinator
//!         .create_profile(NewProfile::new("MID1", ProfileType::MidTier))
//!         .await?;
//!     println!("created profile {}", profile.id);
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the server binary and integration tests (tests/).

/// Conditional retrieval: HTTP dates, entity tags and 304 decisions
pub mod conditional;

/// Environment-driven configuration
pub mod config;

/// Mutation coordinator and batch planning
pub mod coordinator;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Read-side query service
pub mod query;

/// Parameter resolution
pub mod resolver;

/// Shared server resources handed to routes
pub mod resources;

/// `HTTP` route handlers
pub mod routes;

/// Router assembly and serve loop
pub mod server;

/// Snapshot publisher and modification markers
pub mod snapshot;

/// Association store trait and backends
pub mod store;

// Foundation types live in the core crate
pub use cdn_config_core::{constants, models, pagination};
