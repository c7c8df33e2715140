// ABOUTME: Profile parameter association models - the many-to-many binding rows
// ABOUTME: Defines the composite AssociationKey, the joined ProfileParameter view, and request bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{Parameter, ParameterId, Profile, ProfileId};
use crate::constants::defaults::SECURE_VALUE_MASK;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key of an association; ordering is profile-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationKey {
    /// Profile side
    pub profile_id: ProfileId,
    /// Parameter side
    pub parameter_id: ParameterId,
}

impl AssociationKey {
    /// Create a key from its two halves
    #[must_use]
    pub const fn new(profile_id: ProfileId, parameter_id: ParameterId) -> Self {
        Self {
            profile_id,
            parameter_id,
        }
    }
}

impl fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.profile_id, self.parameter_id)
    }
}

/// Joined view of one association, as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileParameter {
    /// Profile id
    pub profile_id: ProfileId,
    /// Profile name
    pub profile: String,
    /// Parameter id
    pub parameter_id: ParameterId,
    /// Parameter name
    pub parameter: String,
    /// Parameter config file
    pub config_file: String,
    /// Parameter value
    pub value: String,
    /// Whether the parameter value is sensitive
    pub secure: bool,
    /// When the association was created
    pub last_updated: DateTime<Utc>,
}

impl ProfileParameter {
    /// Join a profile and parameter into the API row
    #[must_use]
    pub fn join(profile: &Profile, parameter: &Parameter, last_updated: DateTime<Utc>) -> Self {
        Self {
            profile_id: profile.id,
            profile: profile.name.clone(),
            parameter_id: parameter.id,
            parameter: parameter.name.clone(),
            config_file: parameter.config_file.clone(),
            value: parameter.value.clone(),
            secure: parameter.secure,
            last_updated,
        }
    }

    /// Composite key of this row
    #[must_use]
    pub const fn key(&self) -> AssociationKey {
        AssociationKey::new(self.profile_id, self.parameter_id)
    }

    /// Copy with the value masked when the parameter is secure
    #[must_use]
    pub fn masked(mut self) -> Self {
        if self.secure {
            SECURE_VALUE_MASK.clone_into(&mut self.value);
        }
        self
    }
}

/// One `{profileId, parameterId}` pair as submitted by a client
///
/// Fields are optional so a missing field surfaces as a validation error naming
/// the field instead of a deserialization failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileParameterRequest {
    /// Profile side
    #[serde(default)]
    pub profile_id: Option<i64>,
    /// Parameter side
    #[serde(default)]
    pub parameter_id: Option<i64>,
}

impl ProfileParameterRequest {
    /// Request for a fully specified pair
    #[must_use]
    pub const fn new(profile_id: ProfileId, parameter_id: ParameterId) -> Self {
        Self {
            profile_id: Some(profile_id.0),
            parameter_id: Some(parameter_id.0),
        }
    }
}

/// Equality filters for association listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssociationFilter {
    /// Restrict to one profile
    pub profile_id: Option<ProfileId>,
    /// Restrict to one parameter
    pub parameter_id: Option<ParameterId>,
}

impl AssociationFilter {
    /// Whether a key passes the filter
    #[must_use]
    pub fn matches(&self, key: &AssociationKey) -> bool {
        self.profile_id.is_none_or(|p| p == key.profile_id)
            && self.parameter_id.is_none_or(|p| p == key.parameter_id)
    }
}
