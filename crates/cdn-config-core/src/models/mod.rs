// ABOUTME: Core data models for the CDN profile configuration engine
// ABOUTME: Re-exports Profile, Parameter, ProfileParameter, Server and the API envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! This module contains the core data structures shared by the store backends,
//! the mutation coordinator, the resolver and the HTTP layer.
//!
//! ## Core Models
//!
//! - `Profile`: a named configuration template assigned to a group of servers
//! - `Parameter`: one configuration directive bound to a config file
//! - `AssociationKey` / `ProfileParameter`: the many-to-many binding between the two
//! - `Server`: a cache server whose configuration is its profile's resolution
//! - `ApiEnvelope`: the `{"response": ..., "alerts": [...]}` wrapper of every success body

mod association;
mod envelope;
mod ids;
mod parameter;
mod profile;
mod server;

pub use association::{AssociationFilter, AssociationKey, ProfileParameter, ProfileParameterRequest};
pub use envelope::{Alert, AlertLevel, ApiEnvelope, PageInfo};
pub use ids::{ParameterId, ProfileId, ServerId};
pub use parameter::{NewParameter, Parameter, ParameterFilter};
pub use profile::{NewProfile, Profile, ProfileType};
pub use server::{NewServer, Server};
