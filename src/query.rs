// ABOUTME: Query interface serving filtered association listings and conditional snapshot reads
// ABOUTME: Answers NotModified from modification markers and bodies from the snapshot publisher
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Query Interface
//!
//! Read side of the engine. A read restricted to one profile is served from that
//! profile's snapshot and compared against the profile marker; an unrestricted read
//! pages through the association store and is compared against the global marker.
//! Either way a client whose `If-Modified-Since` is not older than the marker gets
//! `NotModified` without any resolution being computed.

use crate::conditional::{Conditional, Conditions};
use crate::config::ApiConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{AssociationFilter, ParameterId, ProfileId, ProfileParameter};
use crate::pagination::{CursorPage, PaginationParams};
use crate::snapshot::{MarkerScope, Snapshot, SnapshotPublisher};
use crate::store::AssociationStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Filters and paging of an association read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssociationQuery {
    /// Restrict to one profile; served from its snapshot
    pub profile_id: Option<ProfileId>,
    /// Restrict to one parameter
    pub parameter_id: Option<ParameterId>,
    /// Keyset paging, ignored when `profile_id` is set
    pub page: PaginationParams,
}

/// One directive of a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFileEntry {
    /// Parameter id
    pub parameter_id: ParameterId,
    /// Directive name
    pub name: String,
    /// Directive value
    pub value: String,
    /// Whether the value is sensitive
    pub secure: bool,
}

/// Parameters destined for one config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// File name
    pub config_file: String,
    /// Directives in delivery order
    pub parameters: Vec<ConfigFileEntry>,
}

/// Everything a server must render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigFiles {
    /// Server host name
    pub host_name: String,
    /// Profile the configuration comes from
    pub profile_id: ProfileId,
    /// Profile name
    pub profile: String,
    /// Snapshot version the files were built from
    pub version: u64,
    /// Config files ordered by name
    pub config_files: Vec<ConfigFile>,
}

impl ServerConfigFiles {
    fn build(host_name: String, snapshot: &Snapshot) -> Self {
        let mut files: BTreeMap<&str, Vec<ConfigFileEntry>> = BTreeMap::new();
        for parameter in &snapshot.parameters {
            files
                .entry(parameter.config_file.as_str())
                .or_default()
                .push(ConfigFileEntry {
                    parameter_id: parameter.id,
                    name: parameter.name.clone(),
                    value: parameter.value.clone(),
                    secure: parameter.secure,
                });
        }

        Self {
            host_name,
            profile_id: snapshot.profile.id,
            profile: snapshot.profile.name.clone(),
            version: snapshot.version,
            config_files: files
                .into_iter()
                .map(|(config_file, parameters)| ConfigFile {
                    config_file: config_file.to_owned(),
                    parameters,
                })
                .collect(),
        }
    }
}

/// Read-side service
pub struct QueryService {
    store: Arc<dyn AssociationStore>,
    publisher: Arc<SnapshotPublisher>,
    api: ApiConfig,
}

impl QueryService {
    /// Create a query service
    #[must_use]
    pub fn new(
        store: Arc<dyn AssociationStore>,
        publisher: Arc<SnapshotPublisher>,
        api: ApiConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            api,
        }
    }

    /// Validate raw paging input against the configured limits
    ///
    /// # Errors
    ///
    /// `INVALID_FORMAT` for a malformed cursor, `VALUE_OUT_OF_RANGE` for a zero limit
    pub fn pagination(
        &self,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> AppResult<PaginationParams> {
        PaginationParams::parse(
            cursor,
            limit,
            self.api.default_page_limit,
            self.api.max_page_limit,
        )
    }

    fn mask(&self, row: ProfileParameter) -> ProfileParameter {
        if self.api.expose_secure_values {
            row
        } else {
            row.masked()
        }
    }

    async fn ensure_profile(&self, profile_id: ProfileId) -> AppResult<()> {
        if self.publisher.is_current(profile_id).await
            || self.store.get_profile(profile_id).await?.is_some()
        {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Profile {profile_id}"))
                .with_resource_id(profile_id.to_string()))
        }
    }

    /// Conditional association read
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` when `profile_id` names an unknown profile, or a storage
    /// error
    pub async fn get(
        &self,
        query: AssociationQuery,
        conditions: &Conditions,
    ) -> AppResult<Conditional<CursorPage<ProfileParameter>>> {
        match query.profile_id {
            Some(profile_id) => {
                self.profile_rows(profile_id, query.parameter_id, conditions)
                    .await
            }
            None => self.all_rows(query, conditions).await,
        }
    }

    async fn profile_rows(
        &self,
        profile_id: ProfileId,
        parameter_id: Option<ParameterId>,
        conditions: &Conditions,
    ) -> AppResult<Conditional<CursorPage<ProfileParameter>>> {
        self.ensure_profile(profile_id).await?;

        let marker = self.publisher.marker(MarkerScope::Profile(profile_id));
        if conditions.not_modified(marker.last_modified, None) {
            return Ok(Conditional::NotModified {
                last_modified: marker.last_modified,
                etag: None,
            });
        }

        let snapshot = self.publisher.snapshot(profile_id).await?;
        let rows: Vec<ProfileParameter> = snapshot
            .parameters_matching(parameter_id)
            .map(|parameter| {
                self.mask(ProfileParameter::join(
                    &snapshot.profile,
                    parameter,
                    snapshot.last_modified,
                ))
            })
            .collect();

        Ok(Conditional::Fresh {
            body: CursorPage::new(rows, None, false),
            last_modified: snapshot.last_modified,
            etag: None,
        })
    }

    async fn all_rows(
        &self,
        query: AssociationQuery,
        conditions: &Conditions,
    ) -> AppResult<Conditional<CursorPage<ProfileParameter>>> {
        let marker = self.publisher.marker(MarkerScope::Global);
        if conditions.not_modified(marker.last_modified, None) {
            return Ok(Conditional::NotModified {
                last_modified: marker.last_modified,
                etag: None,
            });
        }

        let filter = AssociationFilter {
            profile_id: None,
            parameter_id: query.parameter_id,
        };
        let page = self.store.list_associations(filter, query.page).await?;

        Ok(Conditional::Fresh {
            body: page.map(|row| self.mask(row)),
            last_modified: marker.last_modified,
            etag: None,
        })
    }

    /// Conditional read of a profile's snapshot
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` for an unknown profile, or a storage error
    pub async fn resolution(
        &self,
        profile_id: ProfileId,
        conditions: &Conditions,
    ) -> AppResult<Conditional<Arc<Snapshot>>> {
        let snapshot = self.publisher.snapshot(profile_id).await?;
        let last_modified = snapshot.last_modified;
        let etag = Some(snapshot.etag());
        Ok(Conditional::evaluate(conditions, last_modified, etag, || {
            snapshot
        }))
    }

    /// Conditional read of a server's configuration grouped by config file
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` for an unknown host name, or a storage error
    pub async fn server_config(
        &self,
        host_name: &str,
        conditions: &Conditions,
    ) -> AppResult<Conditional<ServerConfigFiles>> {
        let server = self.publisher.resolver().server(host_name).await?;
        let snapshot = self.publisher.snapshot(server.profile_id).await?;
        Ok(Conditional::evaluate(
            conditions,
            snapshot.last_modified,
            Some(snapshot.etag()),
            || ServerConfigFiles::build(server.host_name, &snapshot),
        ))
    }
}
