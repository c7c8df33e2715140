// ABOUTME: Profile route handlers for listing, reading, creating, updating and deleting profiles
// ABOUTME: Deleting a profile cascades its associations; assigned servers block the delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::common::{parse_body, parse_number};
use crate::errors::AppError;
use crate::models::{ApiEnvelope, NewProfile, ProfileId};
use crate::resources::ServerResources;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    name: Option<String>,
}

/// Profile routes
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/profiles",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/profiles/:id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    fn profile_id(raw: &str) -> Result<ProfileId, AppError> {
        parse_number("id", raw).map(ProfileId)
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<ListQuery>,
    ) -> Result<Response, AppError> {
        let profiles = match params.name.as_deref() {
            Some(name) => resources
                .store
                .find_profile_by_name(name)
                .await?
                .into_iter()
                .collect(),
            None => resources.store.list_profiles().await?,
        };
        Ok(Json(ApiEnvelope::new(profiles)).into_response())
    }

    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = Self::profile_id(&id)?;
        let profile = resources
            .store
            .get_profile(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {id}")))?;
        Ok(Json(ApiEnvelope::new(profile)).into_response())
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let request: NewProfile = parse_body(&body)?;
        let profile = resources.coordinator.create_profile(request).await?;
        let text = format!("Profile {} was created.", profile.name);
        Ok(Json(ApiEnvelope::with_success(profile, text)).into_response())
    }

    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let id = Self::profile_id(&id)?;
        let request: NewProfile = parse_body(&body)?;
        let profile = resources.coordinator.update_profile(id, request).await?;
        let text = format!("Profile {} was updated.", profile.name);
        Ok(Json(ApiEnvelope::with_success(profile, text)).into_response())
    }

    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = Self::profile_id(&id)?;
        let profile = resources.coordinator.delete_profile(id).await?;
        let text = format!("Profile {} was deleted.", profile.name);
        Ok(Json(ApiEnvelope::with_success(profile, text)).into_response())
    }
}
