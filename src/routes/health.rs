// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Liveness always answers; readiness runs the store health check
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Health check routes for service monitoring
//!
//! This module provides liveness and readiness endpoints for load balancer
//! health checks.

use crate::constants::endpoints::{HEALTH_CHECK, READY_CHECK};
use crate::resources::ServerResources;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use tracing::warn;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(HEALTH_CHECK, get(Self::health_handler))
            .route(READY_CHECK, get(Self::ready_handler))
            .with_state(resources)
    }

    async fn health_handler() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    async fn ready_handler(
        State(resources): State<Arc<ServerResources>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let backend = resources.store.backend_name();
        let snapshots = resources.publisher.stats().await;

        match resources.store.health_check().await {
            Ok(()) => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "ready",
                    "store": backend,
                    "snapshots": snapshots,
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            ),
            Err(e) => {
                warn!(store = backend, error = %e, "Readiness check failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(serde_json::json!({
                        "status": "unavailable",
                        "store": backend,
                        "error": e.to_string(),
                        "timestamp": chrono::Utc::now().to_rfc3339()
                    })),
                )
            }
        }
    }
}
