// ABOUTME: Core types and constants for the CDN profile configuration engine
// ABOUTME: Foundation crate with error handling, models, pagination, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # CDN Config Core
//!
//! Foundation crate providing shared types and constants for the CDN profile
//! configuration engine. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `StoreError`
//! - **constants**: Application-wide constants organized by domain
//! - **models**: Profiles, parameters, associations, servers and the response envelope
//! - **pagination**: Cursor-based pagination over association keys

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration values organized by domain
pub mod constants;

/// Cursor-based pagination for efficient data traversal
pub mod pagination;

/// Core data models (Profile, Parameter, `ProfileParameter`, Server)
pub mod models;
