// ABOUTME: Association store abstraction with in-memory and SQLite backends
// ABOUTME: Owns profiles, parameters, servers and the profile-parameter join under strict invariants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Association Store
//!
//! Durable home of the association graph. Every backend guarantees:
//!
//! - a `(profile, parameter)` pair exists at most once;
//! - a pair can only reference existing entities;
//! - deleting a profile or parameter removes its pairs in the same atomic step;
//! - deleting an absent pair is an error, never a silent no-op.
//!
//! Callers do not mutate the store directly: writes go through the
//! [`MutationCoordinator`](crate::coordinator::MutationCoordinator), which serializes
//! per profile and invalidates published snapshots after each commit.

/// Arena-of-entities backend guarded by one async `RwLock`
pub mod memory;
/// `SQLite` backend built on `sqlx`
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{DatabaseConfig, DatabaseUrl};
use crate::errors::StoreError;
use crate::models::{
    AssociationFilter, AssociationKey, NewParameter, NewProfile, Parameter, ParameterFilter,
    ParameterId, Profile, ProfileId, ProfileParameter, Server, ServerId,
};
use crate::pagination::{Cursor, CursorPage, PaginationParams};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Existence facts for the entities and pairs referenced by a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchLookup {
    /// Referenced profiles that exist
    pub profiles: BTreeSet<ProfileId>,
    /// Referenced parameters that exist
    pub parameters: BTreeSet<ParameterId>,
    /// Referenced pairs that are already associated
    pub existing: BTreeSet<AssociationKey>,
}

/// Storage contract for the association graph and the entities it joins
#[async_trait]
pub trait AssociationStore: Send + Sync {
    /// Short backend name for logs and readiness output
    fn backend_name(&self) -> &'static str;

    /// Verify the backend can serve requests
    async fn health_check(&self) -> StoreResult<()>;

    // ================================
    // Profiles
    // ================================

    /// Insert a profile; names are unique
    async fn create_profile(&self, profile: &NewProfile) -> StoreResult<Profile>;

    /// Replace a profile's name, description and type
    async fn update_profile(&self, id: ProfileId, profile: &NewProfile) -> StoreResult<Profile>;

    /// Delete a profile and every association it has
    ///
    /// Fails with `InUse` while servers are assigned to the profile.
    async fn delete_profile(&self, id: ProfileId) -> StoreResult<Profile>;

    /// Fetch one profile
    async fn get_profile(&self, id: ProfileId) -> StoreResult<Option<Profile>>;

    /// Fetch a profile by its unique name
    async fn find_profile_by_name(&self, name: &str) -> StoreResult<Option<Profile>>;

    /// All profiles ordered by id
    async fn list_profiles(&self) -> StoreResult<Vec<Profile>>;

    // ================================
    // Parameters
    // ================================

    /// Insert a parameter; `(name, config_file, value)` is unique
    async fn create_parameter(&self, parameter: &NewParameter) -> StoreResult<Parameter>;

    /// Replace a parameter, returning it with the profiles that reference it
    async fn update_parameter(
        &self,
        id: ParameterId,
        parameter: &NewParameter,
    ) -> StoreResult<(Parameter, Vec<ProfileId>)>;

    /// Delete a parameter and its associations, returning the profiles that lost it
    async fn delete_parameter(&self, id: ParameterId) -> StoreResult<Vec<ProfileId>>;

    /// Fetch one parameter
    async fn get_parameter(&self, id: ParameterId) -> StoreResult<Option<Parameter>>;

    /// Parameters matching every supplied filter, ordered by id
    async fn list_parameters(&self, filter: &ParameterFilter) -> StoreResult<Vec<Parameter>>;

    // ================================
    // Servers
    // ================================

    /// Register a server on an existing profile; host names are unique
    async fn create_server(&self, host_name: &str, profile_id: ProfileId) -> StoreResult<Server>;

    /// Remove a server
    async fn delete_server(&self, id: ServerId) -> StoreResult<Server>;

    /// Fetch a server by host name
    async fn get_server_by_host(&self, host_name: &str) -> StoreResult<Option<Server>>;

    /// All servers ordered by id
    async fn list_servers(&self) -> StoreResult<Vec<Server>>;

    // ================================
    // Associations
    // ================================

    /// Which entities and pairs referenced by `keys` exist, read atomically
    async fn lookup(&self, keys: &[AssociationKey]) -> StoreResult<BatchLookup>;

    /// Create one association
    async fn create_association(&self, key: AssociationKey) -> StoreResult<ProfileParameter> {
        let mut rows = self.create_associations(&[key]).await?;
        rows.pop()
            .ok_or_else(|| StoreError::storage("association insert returned no row"))
    }

    /// Create every association or none
    ///
    /// Invariants are re-checked inside the backend's atomic section; the first
    /// violation aborts the whole batch.
    async fn create_associations(
        &self,
        keys: &[AssociationKey],
    ) -> StoreResult<Vec<ProfileParameter>>;

    /// Remove one association; absent pairs fail with `AssociationNotFound`
    async fn delete_association(&self, key: AssociationKey) -> StoreResult<()>;

    /// Whether the pair is currently associated
    async fn association_exists(&self, key: AssociationKey) -> StoreResult<bool>;

    /// Associations of one profile ordered by parameter id
    async fn list_by_profile(&self, profile_id: ProfileId) -> StoreResult<Vec<ProfileParameter>>;

    /// Associations of one parameter ordered by profile id
    async fn list_by_parameter(
        &self,
        parameter_id: ParameterId,
    ) -> StoreResult<Vec<ProfileParameter>>;

    /// Keyset-paginated association rows in key order
    async fn list_associations(
        &self,
        filter: AssociationFilter,
        page: PaginationParams,
    ) -> StoreResult<CursorPage<ProfileParameter>>;

    /// A profile together with every parameter bound to it, read atomically
    async fn profile_with_parameters(
        &self,
        profile_id: ProfileId,
    ) -> StoreResult<Option<(Profile, Vec<Parameter>)>>;
}

/// Open the backend selected by configuration
///
/// # Errors
///
/// Returns a storage error if the `SQLite` database cannot be opened or migrated
pub async fn open_store(config: &DatabaseConfig) -> StoreResult<Arc<dyn AssociationStore>> {
    let store: Arc<dyn AssociationStore> = match &config.url {
        DatabaseUrl::Memory => Arc::new(InMemoryStore::new()),
        DatabaseUrl::SqliteMemory | DatabaseUrl::Sqlite { .. } => {
            Arc::new(SqliteStore::open(&config.url, config.max_connections).await?)
        }
    };

    info!(backend = store.backend_name(), url = %config.url, "Association store opened");
    Ok(store)
}

/// Trim a fetched page to `limit` rows and derive the next cursor
pub(crate) fn into_page(
    mut rows: Vec<ProfileParameter>,
    limit: usize,
) -> CursorPage<ProfileParameter> {
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    let next_cursor = if has_more {
        rows.last().map(|row| Cursor::after(row.key()))
    } else {
        None
    };
    CursorPage::new(rows, next_cursor, has_more)
}
