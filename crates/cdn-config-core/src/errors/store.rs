// ABOUTME: Structured error types returned by association store backends
// ABOUTME: Maps uniqueness, reference, and storage failures onto AppError codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AppError, ErrorCode};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Kind of entity a store error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// A profile
    Profile,
    /// A parameter
    Parameter,
    /// A server
    Server,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Parameter => write!(f, "parameter"),
            Self::Server => write!(f, "server"),
        }
    }
}

/// Errors produced by `AssociationStore` implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `(profile, parameter)` pair is already present
    #[error("parameter {parameter_id} is already associated with profile {profile_id}")]
    AssociationExists {
        /// Profile side of the pair
        profile_id: i64,
        /// Parameter side of the pair
        parameter_id: i64,
    },

    /// The pair to delete does not exist
    #[error("no association exists between profile {profile_id} and parameter {parameter_id}")]
    AssociationNotFound {
        /// Profile side of the pair
        profile_id: i64,
        /// Parameter side of the pair
        parameter_id: i64,
    },

    /// A mutation referenced an entity that does not exist
    #[error("{entity} {id} does not exist")]
    MissingReference {
        /// Referenced entity kind
        entity: EntityKind,
        /// Referenced id
        id: i64,
    },

    /// Direct lookup of an entity by id failed
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: EntityKind,
        /// Requested id
        id: i64,
    },

    /// A uniquely named entity already exists
    #[error("{entity} {key} already exists")]
    Duplicate {
        /// Entity kind
        entity: EntityKind,
        /// The natural key that collided
        key: String,
    },

    /// The entity is still referenced and cannot be removed
    #[error("{entity} {id} is in use: {reason}")]
    InUse {
        /// Entity kind
        entity: EntityKind,
        /// Entity id
        id: i64,
        /// Why the entity is still referenced
        reason: String,
    },

    /// Underlying persistence failure
    #[error("storage failure: {context}")]
    Storage {
        /// Backend supplied context
        context: String,
    },
}

impl StoreError {
    /// Convenience constructor for persistence failures
    pub fn storage(context: impl Into<String>) -> Self {
        Self::Storage {
            context: context.into(),
        }
    }

    /// Error code this store error surfaces as
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AssociationExists { .. } | Self::Duplicate { .. } => {
                ErrorCode::ResourceAlreadyExists
            }
            Self::AssociationNotFound { .. } => ErrorCode::AssociationNotFound,
            Self::MissingReference { .. } => ErrorCode::ReferenceNotFound,
            Self::NotFound { .. } => ErrorCode::ResourceNotFound,
            Self::InUse { .. } => ErrorCode::ResourceInUse,
            Self::Storage { .. } => ErrorCode::StorageError,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        let code = error.code();
        let message = error.to_string();
        let details = match &error {
            StoreError::AssociationExists {
                profile_id,
                parameter_id,
            }
            | StoreError::AssociationNotFound {
                profile_id,
                parameter_id,
            } => serde_json::json!({ "profileId": profile_id, "parameterId": parameter_id }),
            StoreError::MissingReference { entity, id }
            | StoreError::NotFound { entity, id }
            | StoreError::InUse { entity, id, .. } => {
                serde_json::json!({ "entity": entity, "id": id })
            }
            StoreError::Duplicate { entity, key } => {
                serde_json::json!({ "entity": entity, "key": key })
            }
            StoreError::Storage { .. } => serde_json::Value::Null,
        };

        Self::new(code, message).with_details(details)
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage {
            context: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_pair_is_client_error() {
        let error: AppError = StoreError::AssociationExists {
            profile_id: 7,
            parameter_id: 42,
        }
        .into();

        assert_eq!(error.code, ErrorCode::ResourceAlreadyExists);
        assert_eq!(error.http_status(), 400);
        assert_eq!(error.context.details["profileId"], 7);
        assert_eq!(error.context.details["parameterId"], 42);
    }

    #[test]
    fn test_missing_reference_names_entity() {
        let error: AppError = StoreError::MissingReference {
            entity: EntityKind::Parameter,
            id: 9,
        }
        .into();

        assert_eq!(error.code, ErrorCode::ReferenceNotFound);
        assert_eq!(error.message, "parameter 9 does not exist");
        assert_eq!(error.context.details["entity"], "parameter");
    }

    #[test]
    fn test_storage_failure_is_server_error() {
        let error: AppError = StoreError::storage("disk full").into();
        assert_eq!(error.http_status(), 500);
    }
}
