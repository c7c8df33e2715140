// ABOUTME: Parameter route handlers for filtered listing, reading, creating, updating and deleting
// ABOUTME: Updates and deletes propagate to every profile that references the parameter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::common::{parse_body, parse_number};
use crate::errors::AppError;
use crate::models::{ApiEnvelope, NewParameter, ParameterFilter, ParameterId};
use crate::resources::ServerResources;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

/// Parameter routes
pub struct ParameterRoutes;

impl ParameterRoutes {
    /// Create all parameter routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/parameters",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/parameters/:id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    fn parameter_id(raw: &str) -> Result<ParameterId, AppError> {
        parse_number("id", raw).map(ParameterId)
    }

    fn expose(resources: &ServerResources) -> bool {
        resources.config.api.expose_secure_values
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(filter): Query<ParameterFilter>,
    ) -> Result<Response, AppError> {
        let expose = Self::expose(&resources);
        let parameters: Vec<_> = resources
            .store
            .list_parameters(&filter)
            .await?
            .into_iter()
            .map(|p| if expose { p } else { p.masked() })
            .collect();
        Ok(Json(ApiEnvelope::new(parameters)).into_response())
    }

    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = Self::parameter_id(&id)?;
        let parameter = resources
            .store
            .get_parameter(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Parameter {id}")))?;
        let parameter = if Self::expose(&resources) {
            parameter
        } else {
            parameter.masked()
        };
        Ok(Json(ApiEnvelope::new(parameter)).into_response())
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let request: NewParameter = parse_body(&body)?;
        let parameter = resources.coordinator.create_parameter(request).await?;
        let text = format!("Parameter {} was created.", parameter.name);
        Ok(Json(ApiEnvelope::with_success(parameter, text)).into_response())
    }

    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let id = Self::parameter_id(&id)?;
        let request: NewParameter = parse_body(&body)?;
        let parameter = resources.coordinator.update_parameter(id, request).await?;
        let text = format!("Parameter {} was updated.", parameter.name);
        Ok(Json(ApiEnvelope::with_success(parameter, text)).into_response())
    }

    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = Self::parameter_id(&id)?;
        let profiles = resources.coordinator.delete_parameter(id).await?;
        let text = format!(
            "Parameter {id} was deleted from {} profile(s).",
            profiles.len()
        );
        Ok(Json(ApiEnvelope::with_success(profiles, text)).into_response())
    }
}
