// ABOUTME: Unified error handling with standard error codes and HTTP status mapping
// ABOUTME: Defines AppError, ErrorCode, ErrorResponse and the store error taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! This module provides a centralized error handling system for the configuration
//! engine. It defines standard error types, error codes, and HTTP response formatting
//! to ensure consistent error handling across the store, the coordinator and the API.
//!
//! Client-side failures (missing fields, unknown references, duplicate pairs, deletes of
//! absent pairs) always map to a `400` class status. Duplicate association creation in
//! particular is reported as `400`, not `409`: agents and scripts built against the
//! existing API depend on that status.

/// Store-level error taxonomy shared by every `AssociationStore` backend
pub mod store;

pub use store::{EntityKind, StoreError};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat = 3002,
    #[serde(rename = "VALUE_OUT_OF_RANGE")]
    ValueOutOfRange = 3003,
    #[serde(rename = "REFERENCE_NOT_FOUND")]
    ReferenceNotFound = 3004,
    #[serde(rename = "ASSOCIATION_NOT_FOUND")]
    AssociationNotFound = 3005,

    // Resource Management (4000-4999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists = 4001,
    #[serde(rename = "RESOURCE_IN_USE")]
    ResourceInUse = 4002,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            // 400 Bad Request; duplicates stay in this class on purpose
            Self::InvalidInput
            | Self::MissingRequiredField
            | Self::InvalidFormat
            | Self::ValueOutOfRange
            | Self::ReferenceNotFound
            | Self::AssociationNotFound
            | Self::ResourceAlreadyExists
            | Self::ResourceInUse => 400,

            // 404 Not Found
            Self::ResourceNotFound => 404,

            // 500 Internal Server Error
            Self::InternalError | Self::StorageError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::InvalidFormat => "The data format is invalid",
            Self::ValueOutOfRange => "The provided value is outside the acceptable range",
            Self::ReferenceNotFound => "A referenced profile or parameter does not exist",
            Self::AssociationNotFound => "The profile parameter association does not exist",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::ResourceInUse => "The resource is still referenced and cannot be removed",
            Self::InternalError => "An internal server error occurred",
            Self::StorageError => "Storage operation failed",
        }
    }

    /// Whether this code belongs to the client error class
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Resource ID if applicable
    pub resource_id: Option<String>,
    /// Additional key-value context
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            resource_id: None,
            details: serde_json::Value::Null,
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Add a resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Structured details (violations, offending ids)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                details: error.context.details,
            },
        }
    }
}

/// Convenience functions for creating common errors
impl AppError {
    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing from a request
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("'{field}' is required"),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use super::{AppError, ErrorResponse};
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use http::StatusCode;

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if status.is_server_error() {
                tracing::error!(code = ?self.code, error = %self, "Request failed");
            } else {
                tracing::debug!(code = ?self.code, error = %self, "Request rejected");
            }

            (status, Json(ErrorResponse::from(self))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::MissingRequiredField.http_status(), 400);
        assert_eq!(ErrorCode::ResourceAlreadyExists.http_status(), 400);
        assert_eq!(ErrorCode::AssociationNotFound.http_status(), 400);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::StorageError.http_status(), 500);
    }

    #[test]
    fn test_app_error_creation() {
        let error = AppError::invalid_input("bad pair").with_resource_id("7:42");

        assert_eq!(error.code, ErrorCode::InvalidInput);
        assert_eq!(error.context.resource_id.as_deref(), Some("7:42"));
        assert_eq!(error.to_string(), "The provided input is invalid: bad pair");
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::new(ErrorCode::ResourceAlreadyExists, "duplicate")
            .with_details(serde_json::json!({ "violations": [{ "index": 0 }] }));
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("RESOURCE_ALREADY_EXISTS"));
        assert!(json.contains("violations"));
    }

    #[test]
    fn test_null_details_are_omitted() {
        let response = ErrorResponse::from(AppError::not_found("Profile 3"));
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("details"));
        assert!(json.contains("Profile 3 not found"));
    }
}
