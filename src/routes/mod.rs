// ABOUTME: Route module organization for the CDN configuration HTTP API
// ABOUTME: Groups handlers by resource; each module only parses requests and delegates to services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the configuration API
//!
//! Each resource module exposes a `routes(resources)` constructor returning an axum
//! `Router` with its state applied. Handlers stay thin: they parse the request,
//! call the coordinator or the query service, and wrap the result in the
//! `{"response": ..., "alerts": [...]}` envelope.

/// Request parsing and conditional response helpers
mod common;
/// Liveness and readiness
pub mod health;
/// Parameter CRUD
pub mod parameters;
/// Profile parameter associations and profile snapshots
pub mod profile_parameters;
/// Profile CRUD
pub mod profiles;
/// Server registration and config files
pub mod servers;

pub use health::HealthRoutes;
pub use parameters::ParameterRoutes;
pub use profile_parameters::ProfileParameterRoutes;
pub use profiles::ProfileRoutes;
pub use servers::ServerRoutes;
