// ABOUTME: Profile parameter route handlers for association reads, batch creates and deletes
// ABOUTME: Serves conditional listings and profile snapshots with Last-Modified and ETag headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Profile parameter routes
//!
//! `POST /profileparameters` accepts a single `{profileId, parameterId}` object, a
//! `{"profileParameters": [...]}` wrapper, or a bare array. Batches are applied all
//! or nothing.

use super::common::{conditional, conditions, parse_body, parse_number, parse_optional};
use crate::errors::AppError;
use crate::models::{
    ApiEnvelope, AssociationKey, ParameterId, ProfileId, ProfileParameterRequest,
};
use crate::query::AssociationQuery;
use crate::resources::ServerResources;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Query string of the association listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    profile_id: Option<String>,
    parameter_id: Option<String>,
    limit: Option<String>,
    cursor: Option<String>,
}

/// Query string of `DELETE /profiles/:id/parameters`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteQuery {
    parameter_id: Option<String>,
}

/// Accepted create payload shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateBody {
    Wrapped {
        #[serde(rename = "profileParameters")]
        profile_parameters: Vec<ProfileParameterRequest>,
    },
    Many(Vec<ProfileParameterRequest>),
    One(ProfileParameterRequest),
}

/// Profile parameter routes
pub struct ProfileParameterRoutes;

impl ProfileParameterRoutes {
    /// Create all profile parameter routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/profileparameters",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/profileparameters/:profile_id/:parameter_id",
                delete(Self::handle_delete),
            )
            .route(
                "/profiles/:id/parameters",
                get(Self::handle_resolution).delete(Self::handle_delete_by_query),
            )
            .with_state(resources)
    }

    /// Handle conditional association listing
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(params): Query<ListQuery>,
    ) -> Result<Response, AppError> {
        let query = AssociationQuery {
            profile_id: parse_optional("profileId", params.profile_id.as_deref())?.map(ProfileId),
            parameter_id: parse_optional("parameterId", params.parameter_id.as_deref())?
                .map(ParameterId),
            page: resources.query.pagination(
                params.cursor.as_deref(),
                parse_optional("limit", params.limit.as_deref())?,
            )?,
        };

        let outcome = resources.query.get(query, &conditions(&headers)).await?;
        Ok(conditional(outcome, |page| {
            let info = page.page_info();
            Json(ApiEnvelope::new(page.items).with_page(info)).into_response()
        }))
    }

    /// Handle single or batch association create
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        match parse_body::<CreateBody>(&body)? {
            CreateBody::One(request) => {
                let row = resources.coordinator.create_one(request).await?;
                let text = format!(
                    "Profile parameter {} was created.",
                    AssociationKey::new(row.profile_id, row.parameter_id)
                );
                Ok(Json(ApiEnvelope::with_success(row, text)).into_response())
            }
            CreateBody::Wrapped {
                profile_parameters: requests,
            }
            | CreateBody::Many(requests) => {
                let rows = resources.coordinator.create_batch(&requests).await?;
                let text = format!("{} profile parameters were created.", rows.len());
                Ok(Json(ApiEnvelope::with_success(rows, text)).into_response())
            }
        }
    }

    /// Handle delete by path pair
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        Path((profile_id, parameter_id)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let key = AssociationKey::new(
            ProfileId(parse_number("profileId", &profile_id)?),
            ParameterId(parse_number("parameterId", &parameter_id)?),
        );
        Self::delete_pair(&resources, key).await
    }

    /// Handle delete by profile path and `parameterId` query
    async fn handle_delete_by_query(
        State(resources): State<Arc<ServerResources>>,
        Path(profile_id): Path<String>,
        Query(params): Query<DeleteQuery>,
    ) -> Result<Response, AppError> {
        let parameter_id = parse_optional::<i64>("parameterId", params.parameter_id.as_deref())?
            .ok_or_else(|| AppError::missing_field("parameterId"))?;
        let key = AssociationKey::new(
            ProfileId(parse_number("id", &profile_id)?),
            ParameterId(parameter_id),
        );
        Self::delete_pair(&resources, key).await
    }

    async fn delete_pair(
        resources: &ServerResources,
        key: AssociationKey,
    ) -> Result<Response, AppError> {
        resources
            .coordinator
            .delete_association(key.profile_id, key.parameter_id)
            .await?;
        let text = format!("Profile parameter {key} was deleted.");
        Ok(Json(ApiEnvelope::with_success(key, text)).into_response())
    }

    /// Handle conditional snapshot read
    async fn handle_resolution(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(profile_id): Path<String>,
    ) -> Result<Response, AppError> {
        let profile_id = ProfileId(parse_number("id", &profile_id)?);
        let outcome = resources
            .query
            .resolution(profile_id, &conditions(&headers))
            .await?;
        Ok(conditional(outcome, |snapshot| {
            Json(ApiEnvelope::new(snapshot.as_ref())).into_response()
        }))
    }
}
