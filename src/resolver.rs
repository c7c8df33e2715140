// ABOUTME: Resolver computing the ordered, deduplicated parameter set of a profile
// ABOUTME: Pure function of store state; servers resolve through their assigned profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use crate::models::{Parameter, Profile, ProfileId, Server};
use crate::store::AssociationStore;
use std::sync::Arc;

/// Resolved configuration of one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Profile the parameters belong to
    pub profile: Profile,
    /// Effective parameters in delivery order
    pub parameters: Vec<Parameter>,
}

/// Computes resolutions from the association store
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn AssociationStore>,
}

impl Resolver {
    /// Create a resolver over a store
    #[must_use]
    pub fn new(store: Arc<dyn AssociationStore>) -> Self {
        Self { store }
    }

    /// Deduplicate by parameter id and sort into delivery order
    ///
    /// Order is config file, then name, then value, then id, so equal inputs always
    /// produce byte-identical output.
    #[must_use]
    pub fn order(mut parameters: Vec<Parameter>) -> Vec<Parameter> {
        parameters.sort_by_key(|p| p.id);
        parameters.dedup_by_key(|p| p.id);
        parameters.sort_by(|a, b| {
            (&a.config_file, &a.name, &a.value, a.id)
                .cmp(&(&b.config_file, &b.name, &b.value, b.id))
        });
        parameters
    }

    /// Resolve a profile
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` for an unknown profile, or a storage error
    pub async fn resolve(&self, profile_id: ProfileId) -> AppResult<Resolution> {
        let (profile, parameters) = self
            .store
            .profile_with_parameters(profile_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Profile {profile_id}"))
                    .with_resource_id(profile_id.to_string())
            })?;

        Ok(Resolution {
            profile,
            parameters: Self::order(parameters),
        })
    }

    /// Look up the server and the profile whose resolution it receives
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` for an unknown host name
    pub async fn server(&self, host_name: &str) -> AppResult<Server> {
        self.store
            .get_server_by_host(host_name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Server {host_name}")).with_resource_id(host_name)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParameterId;
    use chrono::Utc;

    fn parameter(id: i64, config_file: &str, name: &str, value: &str) -> Parameter {
        Parameter {
            id: ParameterId(id),
            name: name.to_owned(),
            config_file: config_file.to_owned(),
            value: value.to_owned(),
            secure: false,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_order_sorts_by_config_file_then_name() {
        let ordered = Resolver::order(vec![
            parameter(1, "storage.config", "Drive_Prefix", "/dev/sd"),
            parameter(2, "records.config", "CONFIG proxy.config.http.server_ports", "INT 80"),
            parameter(3, "records.config", "CONFIG proxy.config.admin.user_id", "STRING ats"),
        ]);

        let ids: Vec<i64> = ordered.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_order_dedups_by_parameter_id() {
        let ordered = Resolver::order(vec![
            parameter(5, "parent.config", "algorithm", "consistent_hash"),
            parameter(5, "parent.config", "algorithm", "consistent_hash"),
            parameter(6, "parent.config", "algorithm", "false"),
        ]);
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let a = vec![
            parameter(10, "remap.config", "location", "/etc/trafficserver"),
            parameter(11, "remap.config", "location", "/opt/trafficserver"),
            parameter(12, "cache.config", "location", "/etc/trafficserver"),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(Resolver::order(a), Resolver::order(b));
    }
}
