// ABOUTME: Mutation coordinator applying validated, all-or-nothing changes to the association store
// ABOUTME: Serializes writes per profile and invalidates published snapshots after every commit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Mutation Coordinator
//!
//! Single entry point for every write. Each operation:
//!
//! 1. validates its input without touching the store;
//! 2. locks the affected profiles (ascending id order);
//! 3. applies the change in one atomic store call;
//! 4. invalidates the affected snapshots before returning.
//!
//! Validation order for associations is missing field, then nonexistent reference,
//! then duplicate pair.

/// Profile, parameter and server mutations
mod entities;
/// Per-profile mutation locks
pub mod locks;
/// Pure batch validation
pub mod plan;

pub use locks::{ProfileGuards, ProfileLocks};
pub use plan::{BatchPlan, Violation};

use crate::errors::{AppError, AppResult};
use crate::models::{
    AssociationKey, ParameterId, ProfileId, ProfileParameter, ProfileParameterRequest,
};
use crate::snapshot::SnapshotPublisher;
use crate::store::AssociationStore;
use std::sync::Arc;
use tracing::info;

/// Validates and applies mutations
pub struct MutationCoordinator {
    store: Arc<dyn AssociationStore>,
    publisher: Arc<SnapshotPublisher>,
    locks: ProfileLocks,
    max_batch_size: usize,
}

impl MutationCoordinator {
    /// Create a coordinator writing to `store` and invalidating `publisher`
    #[must_use]
    pub fn new(
        store: Arc<dyn AssociationStore>,
        publisher: Arc<SnapshotPublisher>,
        max_batch_size: usize,
    ) -> Self {
        Self {
            store,
            publisher,
            locks: ProfileLocks::new(),
            max_batch_size,
        }
    }

    /// Create one association
    ///
    /// # Errors
    ///
    /// `MISSING_REQUIRED_FIELD` for an absent or zero id, `REFERENCE_NOT_FOUND` for an
    /// unknown profile or parameter, `RESOURCE_ALREADY_EXISTS` for an existing pair
    pub async fn create_one(
        &self,
        request: ProfileParameterRequest,
    ) -> AppResult<ProfileParameter> {
        let mut rows = self.create_batch(&[request]).await?;
        rows.pop()
            .ok_or_else(|| AppError::internal("association create returned no row"))
    }

    /// Create every pair in the batch, or none of them
    ///
    /// # Errors
    ///
    /// Returns a client error describing every violation of the first failing
    /// validation pass; nothing is written in that case
    pub async fn create_batch(
        &self,
        requests: &[ProfileParameterRequest],
    ) -> AppResult<Vec<ProfileParameter>> {
        plan::check_size(requests.len(), self.max_batch_size)?;
        let keys = plan::check_fields(requests).map_err(plan::into_error)?;

        let guards = self.locks.acquire(keys.iter().map(|k| k.profile_id)).await;

        let lookup = self.store.lookup(&keys).await?;
        let batch = plan::plan_batch(&keys, &lookup).map_err(plan::into_error)?;

        let rows = self.store.create_associations(&batch.keys).await?;
        self.publisher.invalidate(&batch.profiles);
        drop(guards);

        info!(
            count = rows.len(),
            profiles = ?batch.profiles,
            "Profile parameters created"
        );
        Ok(rows)
    }

    /// Delete one association
    ///
    /// # Errors
    ///
    /// `ASSOCIATION_NOT_FOUND` (400) when the pair does not exist; the store is left
    /// unchanged
    pub async fn delete_association(
        &self,
        profile_id: ProfileId,
        parameter_id: ParameterId,
    ) -> AppResult<()> {
        let key = AssociationKey::new(profile_id, parameter_id);
        let _guards = self.locks.acquire([profile_id]).await;

        self.store.delete_association(key).await?;
        self.publisher.invalidate(&[profile_id]);

        info!(
            profile_id = %profile_id,
            parameter_id = %parameter_id,
            "Profile parameter deleted"
        );
        Ok(())
    }

    /// Store the coordinator writes to
    #[must_use]
    pub fn store(&self) -> &Arc<dyn AssociationStore> {
        &self.store
    }
}
