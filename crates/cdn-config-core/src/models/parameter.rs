// ABOUTME: Parameter model - one configuration directive targeted at a config file
// ABOUTME: Defines Parameter, the NewParameter request body, and list filters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::ParameterId;
use crate::constants::defaults::SECURE_VALUE_MASK;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single configuration directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter identifier
    pub id: ParameterId,
    /// Directive name
    pub name: String,
    /// Config artifact the directive is rendered into
    pub config_file: String,
    /// Directive value
    pub value: String,
    /// Whether the value is sensitive
    #[serde(default)]
    pub secure: bool,
    /// Last time the parameter row changed
    pub last_updated: DateTime<Utc>,
}

impl Parameter {
    /// Copy with the value replaced by a mask when the parameter is secure
    #[must_use]
    pub fn masked(mut self) -> Self {
        if self.secure {
            SECURE_VALUE_MASK.clone_into(&mut self.value);
        }
        self
    }
}

/// Request body for creating or replacing a parameter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParameter {
    /// Directive name
    #[serde(default)]
    pub name: String,
    /// Config artifact the directive is rendered into
    #[serde(default)]
    pub config_file: String,
    /// Directive value
    #[serde(default)]
    pub value: String,
    /// Whether the value is sensitive
    #[serde(default)]
    pub secure: bool,
}

impl NewParameter {
    /// Build a non-secure parameter request
    pub fn new(
        name: impl Into<String>,
        config_file: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            config_file: config_file.into(),
            value: value.into(),
            secure: false,
        }
    }

    /// Require non-empty name, config file and value
    ///
    /// # Errors
    ///
    /// Returns `MISSING_REQUIRED_FIELD` naming the first empty field
    pub fn validate(self) -> AppResult<Self> {
        for (field, value) in [
            ("name", &self.name),
            ("configFile", &self.config_file),
            ("value", &self.value),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::missing_field(field));
            }
        }
        Ok(self)
    }
}

/// Optional equality filters for parameter listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterFilter {
    /// Match on directive name
    pub name: Option<String>,
    /// Match on config file
    pub config_file: Option<String>,
    /// Match on value
    pub value: Option<String>,
}

impl ParameterFilter {
    /// Whether a parameter satisfies every supplied filter
    #[must_use]
    pub fn matches(&self, parameter: &Parameter) -> bool {
        self.name.as_ref().is_none_or(|n| *n == parameter.name)
            && self
                .config_file
                .as_ref()
                .is_none_or(|c| *c == parameter.config_file)
            && self.value.as_ref().is_none_or(|v| *v == parameter.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn parameter(secure: bool) -> Parameter {
        Parameter {
            id: ParameterId(1),
            name: "health.threshold.queryTime".to_owned(),
            config_file: "rascal.properties".to_owned(),
            value: "1000".to_owned(),
            secure,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_empty_config_file_rejected() {
        let err = NewParameter::new("location", " ", "/etc/trafficserver")
            .validate()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert!(err.message.contains("configFile"));
    }

    #[test]
    fn test_masking_only_touches_secure_values() {
        assert_eq!(parameter(false).masked().value, "1000");
        assert_eq!(parameter(true).masked().value, SECURE_VALUE_MASK);
    }

    #[test]
    fn test_filter_matches_all_supplied_fields() {
        let filter = ParameterFilter {
            name: Some("health.threshold.queryTime".to_owned()),
            config_file: Some("rascal.properties".to_owned()),
            value: None,
        };
        assert!(filter.matches(&parameter(false)));

        let miss = ParameterFilter {
            value: Some("2000".to_owned()),
            ..ParameterFilter::default()
        };
        assert!(!miss.matches(&parameter(false)));
    }
}
