// ABOUTME: Shared server resources wiring the store, publisher, coordinator and query service
// ABOUTME: Built once at start-up and handed to every route as axum state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::ServerConfig;
use crate::coordinator::MutationCoordinator;
use crate::errors::AppResult;
use crate::query::QueryService;
use crate::resolver::Resolver;
use crate::snapshot::SnapshotPublisher;
use crate::store::{open_store, AssociationStore};
use std::sync::Arc;
use tracing::info;

/// Everything a request handler needs
pub struct ServerResources {
    /// Active configuration
    pub config: Arc<ServerConfig>,
    /// Association store
    pub store: Arc<dyn AssociationStore>,
    /// Snapshot publisher
    pub publisher: Arc<SnapshotPublisher>,
    /// Write path
    pub coordinator: MutationCoordinator,
    /// Read path
    pub query: QueryService,
}

impl ServerResources {
    /// Wire resources around an already opened store
    #[must_use]
    pub fn new(config: Arc<ServerConfig>, store: Arc<dyn AssociationStore>) -> Self {
        let publisher = Arc::new(SnapshotPublisher::new(
            Resolver::new(Arc::clone(&store)),
            config.snapshot.cache_capacity,
        ));
        let coordinator = MutationCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&publisher),
            config.api.max_batch_size,
        );
        let query = QueryService::new(
            Arc::clone(&store),
            Arc::clone(&publisher),
            config.api.clone(),
        );

        Self {
            config,
            store,
            publisher,
            coordinator,
            query,
        }
    }

    /// Open the configured store and wire resources around it
    ///
    /// Computes every profile's snapshot first when prewarming is enabled.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be opened or listed
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let store = open_store(&config.database).await?;
        let resources = Self::new(Arc::new(config), store);

        if resources.config.snapshot.prewarm {
            let profile_ids: Vec<_> = resources
                .store
                .list_profiles()
                .await?
                .into_iter()
                .map(|profile| profile.id)
                .collect();
            let warmed = resources.publisher.warm(&profile_ids).await;
            info!(
                warmed,
                profiles = profile_ids.len(),
                "Snapshot cache prewarmed"
            );
        }

        Ok(resources)
    }
}
