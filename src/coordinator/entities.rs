// ABOUTME: Profile, parameter and server mutations routed through the coordinator
// ABOUTME: Parameter edits and deletes invalidate every profile that references the parameter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::MutationCoordinator;
use crate::errors::AppResult;
use crate::models::{
    NewParameter, NewProfile, NewServer, Parameter, ParameterId, Profile, ProfileId, Server,
    ServerId,
};
use std::collections::BTreeSet;
use tracing::info;

/// Union of two profile sets, ascending
fn merge_profiles(before: BTreeSet<ProfileId>, after: Vec<ProfileId>) -> Vec<ProfileId> {
    let mut all = before;
    all.extend(after);
    all.into_iter().collect()
}

impl MutationCoordinator {
    /// Create a profile
    ///
    /// # Errors
    ///
    /// `MISSING_REQUIRED_FIELD` for a blank name, `RESOURCE_ALREADY_EXISTS` for a
    /// name already in use
    pub async fn create_profile(&self, profile: NewProfile) -> AppResult<Profile> {
        let profile = profile.validate()?;
        let created = self.store.create_profile(&profile).await?;
        info!(profile_id = %created.id, name = %created.name, "Profile created");
        Ok(created)
    }

    /// Replace a profile's name, description and type
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` for an unknown profile, plus the create errors
    pub async fn update_profile(&self, id: ProfileId, profile: NewProfile) -> AppResult<Profile> {
        let profile = profile.validate()?;
        let _guards = self.locks.acquire([id]).await;

        let updated = self.store.update_profile(id, &profile).await?;
        self.publisher.invalidate(&[id]);

        info!(profile_id = %id, name = %updated.name, "Profile updated");
        Ok(updated)
    }

    /// Delete a profile together with its associations
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` for an unknown profile, `RESOURCE_IN_USE` while servers
    /// are assigned to it
    pub async fn delete_profile(&self, id: ProfileId) -> AppResult<Profile> {
        let guards = self.locks.acquire([id]).await;

        let deleted = self.store.delete_profile(id).await?;
        self.publisher.forget(id).await;
        drop(guards);
        self.locks.remove(id);

        info!(profile_id = %id, name = %deleted.name, "Profile deleted");
        Ok(deleted)
    }

    /// Create a parameter
    ///
    /// # Errors
    ///
    /// `MISSING_REQUIRED_FIELD` for an empty name, config file or value,
    /// `RESOURCE_ALREADY_EXISTS` for a duplicate `(name, configFile, value)`
    pub async fn create_parameter(&self, parameter: NewParameter) -> AppResult<Parameter> {
        let parameter = parameter.validate()?;
        let created = self.store.create_parameter(&parameter).await?;
        info!(
            parameter_id = %created.id,
            name = %created.name,
            config_file = %created.config_file,
            "Parameter created"
        );
        Ok(created)
    }

    async fn referencing_profiles(&self, id: ParameterId) -> AppResult<BTreeSet<ProfileId>> {
        Ok(self
            .store
            .list_by_parameter(id)
            .await?
            .into_iter()
            .map(|row| row.profile_id)
            .collect())
    }

    /// Replace a parameter; the change reaches every profile using it
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` for an unknown parameter, plus the create errors
    pub async fn update_parameter(
        &self,
        id: ParameterId,
        parameter: NewParameter,
    ) -> AppResult<Parameter> {
        let parameter = parameter.validate()?;
        let referencing = self.referencing_profiles(id).await?;
        let _guards = self.locks.acquire(referencing.iter().copied()).await;

        let (updated, affected) = self.store.update_parameter(id, &parameter).await?;
        let invalidated = merge_profiles(referencing, affected);
        self.publisher.invalidate(&invalidated);

        info!(
            parameter_id = %id,
            profiles = invalidated.len(),
            "Parameter updated"
        );
        Ok(updated)
    }

    /// Delete a parameter and every association to it
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` for an unknown parameter
    pub async fn delete_parameter(&self, id: ParameterId) -> AppResult<Vec<ProfileId>> {
        let referencing = self.referencing_profiles(id).await?;
        let _guards = self.locks.acquire(referencing.iter().copied()).await;

        let affected = self.store.delete_parameter(id).await?;
        let invalidated = merge_profiles(referencing, affected);
        self.publisher.invalidate(&invalidated);

        info!(
            parameter_id = %id,
            profiles = invalidated.len(),
            "Parameter deleted"
        );
        Ok(invalidated)
    }

    /// Register a server on a profile
    ///
    /// # Errors
    ///
    /// `MISSING_REQUIRED_FIELD` for a blank host name or absent profile,
    /// `REFERENCE_NOT_FOUND` for an unknown profile, `RESOURCE_ALREADY_EXISTS` for a
    /// host name already registered
    pub async fn create_server(&self, server: NewServer) -> AppResult<Server> {
        let (host_name, profile_id) = server.validate()?;
        let _guards = self.locks.acquire([profile_id]).await;

        let created = self.store.create_server(&host_name, profile_id).await?;
        info!(
            server_id = %created.id,
            host_name = %created.host_name,
            profile_id = %profile_id,
            "Server created"
        );
        Ok(created)
    }

    /// Remove a server
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` for an unknown server
    pub async fn delete_server(&self, id: ServerId) -> AppResult<Server> {
        let deleted = self.store.delete_server(id).await?;
        info!(server_id = %id, host_name = %deleted.host_name, "Server deleted");
        Ok(deleted)
    }
}
