// ABOUTME: Profile model - a named configuration template assigned to servers
// ABOUTME: Defines Profile, ProfileType role enumeration, and the NewProfile request body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::ProfileId;
use crate::errors::{AppError, AppResult, ErrorCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a profile plays in the delivery network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProfileType {
    /// Edge-tier cache
    #[serde(rename = "EDGE")]
    EdgeTier,
    /// Mid-tier cache
    #[serde(rename = "MID")]
    MidTier,
    /// Traffic router
    #[serde(rename = "TR")]
    Router,
    /// Traffic monitor
    #[serde(rename = "TM")]
    Monitor,
    /// Anything else
    #[default]
    #[serde(rename = "UNK")]
    Unknown,
}

impl ProfileType {
    /// Wire/storage representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EdgeTier => "EDGE",
            Self::MidTier => "MID",
            Self::Router => "TR",
            Self::Monitor => "TM",
            Self::Unknown => "UNK",
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EDGE" => Ok(Self::EdgeTier),
            "MID" => Ok(Self::MidTier),
            "TR" => Ok(Self::Router),
            "TM" => Ok(Self::Monitor),
            "UNK" => Ok(Self::Unknown),
            other => Err(AppError::new(
                ErrorCode::InvalidFormat,
                format!("unknown profile type '{other}'"),
            )),
        }
    }
}

/// Named configuration template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Profile identifier
    pub id: ProfileId,
    /// Unique profile name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Role of servers using this profile
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    /// Last time the profile row changed
    pub last_updated: DateTime<Utc>,
}

/// Request body for creating or replacing a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    /// Unique profile name
    #[serde(default)]
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Role of servers using this profile
    #[serde(rename = "type", default)]
    pub profile_type: ProfileType,
}

impl NewProfile {
    /// Build a request with an empty description
    pub fn new(name: impl Into<String>, profile_type: ProfileType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            profile_type,
        }
    }

    /// Reject blank names; trims surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns `MISSING_REQUIRED_FIELD` when the name is empty
    pub fn validate(mut self) -> AppResult<Self> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(AppError::missing_field("name"));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&ProfileType::MidTier).unwrap(),
            "\"MID\""
        );
        assert_eq!("edge".parse::<ProfileType>().unwrap(), ProfileType::EdgeTier);
        assert!("CACHE".parse::<ProfileType>().is_err());
    }

    #[test]
    fn test_blank_profile_name_rejected() {
        let err = NewProfile::new("   ", ProfileType::EdgeTier)
            .validate()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
    }
}
