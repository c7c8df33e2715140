// ABOUTME: Unified error handling re-exported from the core crate
// ABOUTME: AppError, ErrorCode, StoreError and the JSON error response shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Error types are defined in `cdn_config_core::errors` so the models and the
//! pagination helpers can return them; this module re-exports them for the rest
//! of the crate.

pub use cdn_config_core::errors::{
    AppError, AppResult, EntityKind, ErrorCode, ErrorContext, ErrorResponse,
    ErrorResponseDetails, StoreError,
};
