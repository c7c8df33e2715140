// ABOUTME: In-memory association store: entity arenas plus ordered index maps
// ABOUTME: One async RwLock over all tables makes every operation observably atomic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{into_page, AssociationStore, BatchLookup, StoreResult};
use crate::errors::{EntityKind, StoreError};
use crate::models::{
    AssociationFilter, AssociationKey, NewParameter, NewProfile, Parameter, ParameterFilter,
    ParameterId, Profile, ProfileId, ProfileParameter, Server, ServerId,
};
use crate::pagination::{CursorPage, PaginationParams};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    profiles: BTreeMap<ProfileId, Profile>,
    parameters: BTreeMap<ParameterId, Parameter>,
    servers: BTreeMap<ServerId, Server>,
    /// Association key -> creation time; key order is profile-major
    associations: BTreeMap<AssociationKey, DateTime<Utc>>,
    /// Reverse index: parameter -> profiles using it
    by_parameter: HashMap<ParameterId, BTreeSet<ProfileId>>,
    last_profile_id: i64,
    last_parameter_id: i64,
    last_server_id: i64,
}

/// Bounds covering every association of one profile
fn profile_range(profile_id: ProfileId) -> (Bound<AssociationKey>, Bound<AssociationKey>) {
    (
        Bound::Included(AssociationKey::new(profile_id, ParameterId(i64::MIN))),
        Bound::Included(AssociationKey::new(profile_id, ParameterId(i64::MAX))),
    )
}

impl Tables {
    fn row(&self, key: AssociationKey, created: DateTime<Utc>) -> StoreResult<ProfileParameter> {
        let profile = self.profiles.get(&key.profile_id).ok_or_else(|| {
            StoreError::storage(format!("association {key} references a missing profile"))
        })?;
        let parameter = self.parameters.get(&key.parameter_id).ok_or_else(|| {
            StoreError::storage(format!("association {key} references a missing parameter"))
        })?;
        Ok(ProfileParameter::join(profile, parameter, created))
    }

    fn rows<'a>(
        &self,
        entries: impl Iterator<Item = (&'a AssociationKey, &'a DateTime<Utc>)>,
    ) -> StoreResult<Vec<ProfileParameter>> {
        entries.map(|(key, created)| self.row(*key, *created)).collect()
    }

    fn profiles_of(&self, parameter_id: ParameterId) -> Vec<ProfileId> {
        self.by_parameter
            .get(&parameter_id)
            .map(|profiles| profiles.iter().copied().collect())
            .unwrap_or_default()
    }

    fn ensure_unique_profile_name(
        &self,
        name: &str,
        except: Option<ProfileId>,
    ) -> StoreResult<()> {
        let taken = self
            .profiles
            .values()
            .any(|p| p.name == name && Some(p.id) != except);
        if taken {
            return Err(StoreError::Duplicate {
                entity: EntityKind::Profile,
                key: name.to_owned(),
            });
        }
        Ok(())
    }

    fn ensure_unique_parameter(
        &self,
        parameter: &NewParameter,
        except: Option<ParameterId>,
    ) -> StoreResult<()> {
        let taken = self.parameters.values().any(|p| {
            p.name == parameter.name
                && p.config_file == parameter.config_file
                && p.value == parameter.value
                && Some(p.id) != except
        });
        if taken {
            return Err(StoreError::Duplicate {
                entity: EntityKind::Parameter,
                key: format!(
                    "{}/{}/{}",
                    parameter.config_file, parameter.name, parameter.value
                ),
            });
        }
        Ok(())
    }

    /// Check one pair against current state, including pairs staged earlier in the batch
    fn check_insert(
        &self,
        key: AssociationKey,
        staged: &BTreeSet<AssociationKey>,
    ) -> StoreResult<()> {
        if !self.profiles.contains_key(&key.profile_id) {
            return Err(StoreError::MissingReference {
                entity: EntityKind::Profile,
                id: key.profile_id.get(),
            });
        }
        if !self.parameters.contains_key(&key.parameter_id) {
            return Err(StoreError::MissingReference {
                entity: EntityKind::Parameter,
                id: key.parameter_id.get(),
            });
        }
        if self.associations.contains_key(&key) || staged.contains(&key) {
            return Err(StoreError::AssociationExists {
                profile_id: key.profile_id.get(),
                parameter_id: key.parameter_id.get(),
            });
        }
        Ok(())
    }

    fn remove_association(&mut self, key: AssociationKey) -> bool {
        if self.associations.remove(&key).is_none() {
            return false;
        }
        if let Some(profiles) = self.by_parameter.get_mut(&key.parameter_id) {
            profiles.remove(&key.profile_id);
            if profiles.is_empty() {
                self.by_parameter.remove(&key.parameter_id);
            }
        }
        true
    }
}

/// Process-local store; state is lost on restart
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssociationStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        let mut tables = self.tables.write().await;
        tables.ensure_unique_profile_name(&profile.name, None)?;

        tables.last_profile_id += 1;
        let created = Profile {
            id: ProfileId(tables.last_profile_id),
            name: profile.name.clone(),
            description: profile.description.clone(),
            profile_type: profile.profile_type,
            last_updated: Utc::now(),
        };
        tables.profiles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_profile(&self, id: ProfileId, profile: &NewProfile) -> StoreResult<Profile> {
        let mut tables = self.tables.write().await;
        tables.ensure_unique_profile_name(&profile.name, Some(id))?;

        let existing = tables.profiles.get_mut(&id).ok_or(StoreError::NotFound {
            entity: EntityKind::Profile,
            id: id.get(),
        })?;
        existing.name.clone_from(&profile.name);
        existing.description.clone_from(&profile.description);
        existing.profile_type = profile.profile_type;
        existing.last_updated = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_profile(&self, id: ProfileId) -> StoreResult<Profile> {
        let mut tables = self.tables.write().await;
        if !tables.profiles.contains_key(&id) {
            return Err(StoreError::NotFound {
                entity: EntityKind::Profile,
                id: id.get(),
            });
        }

        let assigned = tables.servers.values().filter(|s| s.profile_id == id).count();
        if assigned > 0 {
            return Err(StoreError::InUse {
                entity: EntityKind::Profile,
                id: id.get(),
                reason: format!("{assigned} server(s) are assigned to it"),
            });
        }

        let keys: Vec<AssociationKey> = tables
            .associations
            .range(profile_range(id))
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            tables.remove_association(key);
        }

        tables.profiles.remove(&id).ok_or(StoreError::NotFound {
            entity: EntityKind::Profile,
            id: id.get(),
        })
    }

    async fn get_profile(&self, id: ProfileId) -> StoreResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn find_profile_by_name(&self, name: &str) -> StoreResult<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.values().find(|p| p.name == name).cloned())
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        Ok(self.tables.read().await.profiles.values().cloned().collect())
    }

    async fn create_parameter(&self, parameter: &NewParameter) -> StoreResult<Parameter> {
        let mut tables = self.tables.write().await;
        tables.ensure_unique_parameter(parameter, None)?;

        tables.last_parameter_id += 1;
        let created = Parameter {
            id: ParameterId(tables.last_parameter_id),
            name: parameter.name.clone(),
            config_file: parameter.config_file.clone(),
            value: parameter.value.clone(),
            secure: parameter.secure,
            last_updated: Utc::now(),
        };
        tables.parameters.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_parameter(
        &self,
        id: ParameterId,
        parameter: &NewParameter,
    ) -> StoreResult<(Parameter, Vec<ProfileId>)> {
        let mut tables = self.tables.write().await;
        tables.ensure_unique_parameter(parameter, Some(id))?;

        let existing = tables.parameters.get_mut(&id).ok_or(StoreError::NotFound {
            entity: EntityKind::Parameter,
            id: id.get(),
        })?;
        existing.name.clone_from(&parameter.name);
        existing.config_file.clone_from(&parameter.config_file);
        existing.value.clone_from(&parameter.value);
        existing.secure = parameter.secure;
        existing.last_updated = Utc::now();
        let updated = existing.clone();

        Ok((updated, tables.profiles_of(id)))
    }

    async fn delete_parameter(&self, id: ParameterId) -> StoreResult<Vec<ProfileId>> {
        let mut tables = self.tables.write().await;
        if tables.parameters.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                entity: EntityKind::Parameter,
                id: id.get(),
            });
        }

        let affected = tables.profiles_of(id);
        for profile_id in &affected {
            tables.remove_association(AssociationKey::new(*profile_id, id));
        }
        Ok(affected)
    }

    async fn get_parameter(&self, id: ParameterId) -> StoreResult<Option<Parameter>> {
        Ok(self.tables.read().await.parameters.get(&id).cloned())
    }

    async fn list_parameters(&self, filter: &ParameterFilter) -> StoreResult<Vec<Parameter>> {
        let tables = self.tables.read().await;
        Ok(tables
            .parameters
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn create_server(&self, host_name: &str, profile_id: ProfileId) -> StoreResult<Server> {
        let mut tables = self.tables.write().await;
        if !tables.profiles.contains_key(&profile_id) {
            return Err(StoreError::MissingReference {
                entity: EntityKind::Profile,
                id: profile_id.get(),
            });
        }
        if tables.servers.values().any(|s| s.host_name == host_name) {
            return Err(StoreError::Duplicate {
                entity: EntityKind::Server,
                key: host_name.to_owned(),
            });
        }

        tables.last_server_id += 1;
        let server = Server {
            id: ServerId(tables.last_server_id),
            host_name: host_name.to_owned(),
            profile_id,
            last_updated: Utc::now(),
        };
        tables.servers.insert(server.id, server.clone());
        Ok(server)
    }

    async fn delete_server(&self, id: ServerId) -> StoreResult<Server> {
        self.tables
            .write()
            .await
            .servers
            .remove(&id)
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Server,
                id: id.get(),
            })
    }

    async fn get_server_by_host(&self, host_name: &str) -> StoreResult<Option<Server>> {
        let tables = self.tables.read().await;
        Ok(tables
            .servers
            .values()
            .find(|s| s.host_name == host_name)
            .cloned())
    }

    async fn list_servers(&self) -> StoreResult<Vec<Server>> {
        Ok(self.tables.read().await.servers.values().cloned().collect())
    }

    async fn lookup(&self, keys: &[AssociationKey]) -> StoreResult<BatchLookup> {
        let tables = self.tables.read().await;
        let mut lookup = BatchLookup::default();
        for key in keys {
            if tables.profiles.contains_key(&key.profile_id) {
                lookup.profiles.insert(key.profile_id);
            }
            if tables.parameters.contains_key(&key.parameter_id) {
                lookup.parameters.insert(key.parameter_id);
            }
            if tables.associations.contains_key(key) {
                lookup.existing.insert(*key);
            }
        }
        Ok(lookup)
    }

    async fn create_associations(
        &self,
        keys: &[AssociationKey],
    ) -> StoreResult<Vec<ProfileParameter>> {
        let mut tables = self.tables.write().await;

        // Validate the whole batch before touching any table
        let mut staged = BTreeSet::new();
        for key in keys {
            tables.check_insert(*key, &staged)?;
            staged.insert(*key);
        }

        let now = Utc::now();
        let mut rows = Vec::with_capacity(keys.len());
        for key in keys {
            tables.associations.insert(*key, now);
            tables
                .by_parameter
                .entry(key.parameter_id)
                .or_default()
                .insert(key.profile_id);
            rows.push(tables.row(*key, now)?);
        }
        Ok(rows)
    }

    async fn delete_association(&self, key: AssociationKey) -> StoreResult<()> {
        if self.tables.write().await.remove_association(key) {
            Ok(())
        } else {
            Err(StoreError::AssociationNotFound {
                profile_id: key.profile_id.get(),
                parameter_id: key.parameter_id.get(),
            })
        }
    }

    async fn association_exists(&self, key: AssociationKey) -> StoreResult<bool> {
        Ok(self.tables.read().await.associations.contains_key(&key))
    }

    async fn list_by_profile(&self, profile_id: ProfileId) -> StoreResult<Vec<ProfileParameter>> {
        let tables = self.tables.read().await;
        tables.rows(tables.associations.range(profile_range(profile_id)))
    }

    async fn list_by_parameter(
        &self,
        parameter_id: ParameterId,
    ) -> StoreResult<Vec<ProfileParameter>> {
        let tables = self.tables.read().await;
        tables
            .profiles_of(parameter_id)
            .into_iter()
            .filter_map(|profile_id| {
                let key = AssociationKey::new(profile_id, parameter_id);
                tables.associations.get(&key).map(|created| (key, *created))
            })
            .map(|(key, created)| tables.row(key, created))
            .collect()
    }

    async fn list_associations(
        &self,
        filter: AssociationFilter,
        page: PaginationParams,
    ) -> StoreResult<CursorPage<ProfileParameter>> {
        let tables = self.tables.read().await;
        let lower = page.after.map_or(Bound::Unbounded, Bound::Excluded);

        let matching: Vec<(&AssociationKey, &DateTime<Utc>)> = match filter.profile_id {
            Some(profile_id) => {
                let (_, upper) = profile_range(profile_id);
                let lower = match lower {
                    Bound::Excluded(after) if after.profile_id == profile_id => {
                        Bound::Excluded(after)
                    }
                    Bound::Excluded(after) if after.profile_id > profile_id => {
                        return Ok(CursorPage::empty());
                    }
                    _ => profile_range(profile_id).0,
                };
                tables
                    .associations
                    .range((lower, upper))
                    .filter(|(key, _)| filter.matches(key))
                    .take(page.limit + 1)
                    .collect()
            }
            None => tables
                .associations
                .range((lower, Bound::Unbounded))
                .filter(|(key, _)| filter.matches(key))
                .take(page.limit + 1)
                .collect(),
        };

        Ok(into_page(tables.rows(matching.into_iter())?, page.limit))
    }

    async fn profile_with_parameters(
        &self,
        profile_id: ProfileId,
    ) -> StoreResult<Option<(Profile, Vec<Parameter>)>> {
        let tables = self.tables.read().await;
        let Some(profile) = tables.profiles.get(&profile_id) else {
            return Ok(None);
        };

        let parameters = tables
            .associations
            .range(profile_range(profile_id))
            .filter_map(|(key, _)| tables.parameters.get(&key.parameter_id).cloned())
            .collect();
        Ok(Some((profile.clone(), parameters)))
    }
}
