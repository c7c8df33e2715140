// ABOUTME: Server route handlers for registration, removal and per-server config file retrieval
// ABOUTME: Config files are the server profile's snapshot grouped by file, served conditionally
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::common::{conditional, conditions, parse_body, parse_number};
use crate::errors::AppError;
use crate::models::{ApiEnvelope, NewServer, ServerId};
use crate::resources::ServerResources;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use std::sync::Arc;

/// Server routes
pub struct ServerRoutes;

impl ServerRoutes {
    /// Create all server routes
    ///
    /// `:server` is a numeric id for `DELETE` and a host name for `configfiles`.
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/servers", get(Self::handle_list).post(Self::handle_create))
            .route("/servers/:server", delete(Self::handle_delete))
            .route("/servers/:server/configfiles", get(Self::handle_config_files))
            .with_state(resources)
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let servers = resources.store.list_servers().await?;
        Ok(Json(ApiEnvelope::new(servers)).into_response())
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let request: NewServer = parse_body(&body)?;
        let server = resources.coordinator.create_server(request).await?;
        let text = format!("Server {} was created.", server.host_name);
        Ok(Json(ApiEnvelope::with_success(server, text)).into_response())
    }

    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = ServerId(parse_number("id", &id)?);
        let server = resources.coordinator.delete_server(id).await?;
        let text = format!("Server {} was deleted.", server.host_name);
        Ok(Json(ApiEnvelope::with_success(server, text)).into_response())
    }

    async fn handle_config_files(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(host_name): Path<String>,
    ) -> Result<Response, AppError> {
        let outcome = resources
            .query
            .server_config(&host_name, &conditions(&headers))
            .await?;
        Ok(conditional(outcome, |files| {
            Json(ApiEnvelope::new(files)).into_response()
        }))
    }
}
