// ABOUTME: Server model - a cache server assigned to exactly one profile
// ABOUTME: The server's configuration is the resolution of its profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{ProfileId, ServerId};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A server polling for its configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /// Server identifier
    pub id: ServerId,
    /// Unique host name
    pub host_name: String,
    /// Assigned profile
    pub profile_id: ProfileId,
    /// Last time the server row changed
    pub last_updated: DateTime<Utc>,
}

/// Request body for registering a server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServer {
    /// Unique host name
    #[serde(default)]
    pub host_name: String,
    /// Assigned profile
    pub profile_id: Option<i64>,
}

impl NewServer {
    /// Validate the request and return the normalized host name and profile
    ///
    /// # Errors
    ///
    /// Returns `MISSING_REQUIRED_FIELD` for a blank host name or absent profile,
    /// `INVALID_INPUT` for a non-positive profile id
    pub fn validate(&self) -> AppResult<(String, ProfileId)> {
        let host_name = self.host_name.trim();
        if host_name.is_empty() {
            return Err(AppError::missing_field("hostName"));
        }
        let profile_id = self
            .profile_id
            .map(ProfileId)
            .ok_or_else(|| AppError::missing_field("profileId"))?;
        if !profile_id.is_valid() {
            return Err(AppError::invalid_input("'profileId' must be a positive integer"));
        }
        Ok((host_name.to_owned(), profile_id))
    }
}
