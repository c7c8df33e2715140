// ABOUTME: Snapshot publisher holding immutable, monotonically versioned profile resolutions
// ABOUTME: Tracks per-profile and global modification markers and recomputes snapshots on demand
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Snapshot Publisher
//!
//! Every mutation bumps a [`ModificationMarker`] for each affected profile and for the
//! global scope. A marker carries a generation counter and a `LastModified` time with
//! second granularity; both strictly increase on every bump, even when several bumps
//! land in the same wall-clock second.
//!
//! Snapshots are computed lazily. A cached snapshot is current when its version equals
//! the profile's marker generation; otherwise the next reader recomputes it. Concurrent
//! first readers of a stale profile are coalesced behind a per-profile mutex so the
//! resolution is computed once.

use crate::constants::cache::MIN_SNAPSHOT_CACHE_CAPACITY;
use crate::errors::AppResult;
use crate::models::{Parameter, ParameterId, Profile, ProfileId};
use crate::resolver::{Resolution, Resolver};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use dashmap::DashMap;
use futures_util::future::join_all;
use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Logical resource a marker tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerScope {
    /// Any association, profile or parameter change
    Global,
    /// Changes affecting one profile's resolution
    Profile(ProfileId),
}

/// Generation counter plus the `LastModified` time it was reached at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModificationMarker {
    /// Number of bumps since the publisher started
    pub generation: u64,
    /// Second-granularity modification time
    pub last_modified: DateTime<Utc>,
}

/// Truncate to whole seconds
fn to_second(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TimeDelta::seconds(1)).unwrap_or(at)
}

impl ModificationMarker {
    /// Marker of a resource nobody has modified since `at`
    #[must_use]
    pub fn initial(at: DateTime<Utc>) -> Self {
        Self {
            generation: 0,
            last_modified: to_second(at),
        }
    }

    /// Next marker: generation + 1, `LastModified = max(now, previous + 1s)`
    #[must_use]
    pub fn advanced(&self, now: DateTime<Utc>) -> Self {
        let floor = self.last_modified + TimeDelta::seconds(1);
        Self {
            generation: self.generation + 1,
            last_modified: to_second(now).max(floor),
        }
    }
}

/// Immutable capture of a profile resolution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Profile the snapshot belongs to
    pub profile: Profile,
    /// Effective parameters in delivery order
    pub parameters: Vec<Parameter>,
    /// Marker generation the snapshot was computed for
    pub version: u64,
    /// Modification time of that generation
    pub last_modified: DateTime<Utc>,
    /// SHA-256 of the resolution content, hex encoded
    pub digest: String,
}

impl Snapshot {
    /// Capture a resolution under a marker
    #[must_use]
    pub fn capture(resolution: Resolution, marker: ModificationMarker) -> Self {
        let digest = Self::digest_of(&resolution);
        Self {
            profile: resolution.profile,
            parameters: resolution.parameters,
            version: marker.generation,
            last_modified: marker.last_modified,
            digest,
        }
    }

    fn digest_of(resolution: &Resolution) -> String {
        let mut hasher = Sha256::new();
        hasher.update(resolution.profile.id.get().to_be_bytes());
        hasher.update(resolution.profile.name.as_bytes());
        for parameter in &resolution.parameters {
            hasher.update(parameter.id.get().to_be_bytes());
            for field in [&parameter.config_file, &parameter.name, &parameter.value] {
                hasher.update((field.len() as u64).to_be_bytes());
                hasher.update(field.as_bytes());
            }
            hasher.update([u8::from(parameter.secure)]);
        }
        hex::encode(hasher.finalize())
    }

    /// Strong entity tag for the snapshot content
    #[must_use]
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.digest)
    }

    /// Parameters restricted to one id, or all of them
    pub fn parameters_matching(
        &self,
        parameter_id: Option<ParameterId>,
    ) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |p| parameter_id.is_none_or(|id| p.id == id))
    }
}

/// Cache effectiveness counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherStats {
    /// Reads served from a current cached snapshot
    pub hits: u64,
    /// Reads that found no current snapshot
    pub misses: u64,
    /// Resolutions actually computed
    pub recomputations: u64,
    /// Snapshots currently cached
    pub cached: usize,
    /// Profiles carrying their own modification marker
    pub tracked_profiles: usize,
}

/// Materializes resolutions into cached, versioned snapshots
pub struct SnapshotPublisher {
    resolver: Resolver,
    markers: DashMap<MarkerScope, ModificationMarker>,
    cache: RwLock<LruCache<ProfileId, Arc<Snapshot>>>,
    recompute_locks: DashMap<ProfileId, Arc<Mutex<()>>>,
    started_at: DateTime<Utc>,
    hits: AtomicU64,
    misses: AtomicU64,
    recomputations: AtomicU64,
}

impl SnapshotPublisher {
    const FALLBACK_CAPACITY: NonZeroUsize =
        match NonZeroUsize::new(MIN_SNAPSHOT_CACHE_CAPACITY) {
            Some(n) => n,
            None => unreachable!(),
        };

    /// Create a publisher with a bounded snapshot cache
    #[must_use]
    pub fn new(resolver: Resolver, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(Self::FALLBACK_CAPACITY);
        Self {
            resolver,
            markers: DashMap::new(),
            cache: RwLock::new(LruCache::new(capacity)),
            recompute_locks: DashMap::new(),
            started_at: Utc::now(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            recomputations: AtomicU64::new(0),
        }
    }

    /// Current marker of a scope
    #[must_use]
    pub fn marker(&self, scope: MarkerScope) -> ModificationMarker {
        self.markers
            .get(&scope)
            .map_or_else(|| ModificationMarker::initial(self.started_at), |m| *m)
    }

    fn bump(&self, scope: MarkerScope) -> ModificationMarker {
        let now = Utc::now();
        let started_at = self.started_at;
        *self
            .markers
            .entry(scope)
            .and_modify(|m| *m = m.advanced(now))
            .or_insert_with(|| ModificationMarker::initial(started_at).advanced(now))
    }

    /// Mark the given profiles (and the global scope) as modified
    ///
    /// Must be called after the mutation committed; later readers recompute.
    pub fn invalidate(&self, profile_ids: &[ProfileId]) {
        for profile_id in profile_ids {
            let marker = self.bump(MarkerScope::Profile(*profile_id));
            debug!(
                profile_id = %profile_id,
                version = marker.generation,
                last_modified = %marker.last_modified,
                "Profile snapshot invalidated"
            );
        }
        let global = self.bump(MarkerScope::Global);
        debug!(
            version = global.generation,
            last_modified = %global.last_modified,
            "Global marker advanced"
        );
    }

    /// Drop everything held for a deleted profile
    ///
    /// The recompute lock is held so a resolution started before the delete
    /// publishes before the cache entry and marker are removed.
    pub async fn forget(&self, profile_id: ProfileId) {
        let lock = self.recompute_lock(profile_id);
        let guard = lock.lock().await;

        let global = self.bump(MarkerScope::Global);
        self.cache.write().await.pop(&profile_id);
        self.markers.remove(&MarkerScope::Profile(profile_id));
        drop(guard);
        self.recompute_locks.remove(&profile_id);

        debug!(
            profile_id = %profile_id,
            version = global.generation,
            "Profile snapshot state dropped"
        );
    }

    async fn cached(&self, profile_id: ProfileId, generation: u64) -> Option<Arc<Snapshot>> {
        let snapshot = self
            .cache
            .read()
            .await
            .peek(&profile_id)
            .filter(|snapshot| snapshot.version == generation)
            .cloned()?;

        // Recency is best effort; skipped when a writer holds the cache
        if let Ok(mut cache) = self.cache.try_write() {
            cache.promote(&profile_id);
        }
        Some(snapshot)
    }

    /// Whether a profile has a current snapshot cached
    pub async fn is_current(&self, profile_id: ProfileId) -> bool {
        let generation = self.marker(MarkerScope::Profile(profile_id)).generation;
        self.cache
            .read()
            .await
            .peek(&profile_id)
            .is_some_and(|snapshot| snapshot.version == generation)
    }

    fn recompute_lock(&self, profile_id: ProfileId) -> Arc<Mutex<()>> {
        self.recompute_locks
            .entry(profile_id)
            .or_default()
            .value()
            .clone()
    }

    /// Current snapshot of a profile, recomputing if stale
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` for an unknown profile, or a storage error
    pub async fn snapshot(&self, profile_id: ProfileId) -> AppResult<Arc<Snapshot>> {
        let scope = MarkerScope::Profile(profile_id);

        if let Some(snapshot) = self.cached(profile_id, self.marker(scope).generation).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(snapshot);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let lock = self.recompute_lock(profile_id);
        let _guard = lock.lock().await;

        // Read the marker before resolving so a commit racing the read leaves the
        // snapshot labelled stale
        let marker = self.marker(scope);
        if let Some(snapshot) = self.cached(profile_id, marker.generation).await {
            return Ok(snapshot);
        }

        self.recomputations.fetch_add(1, Ordering::Relaxed);
        let resolution = self.resolver.resolve(profile_id).await?;
        let snapshot = Arc::new(Snapshot::capture(resolution, marker));
        self.publish(profile_id, Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }

    async fn publish(&self, profile_id: ProfileId, snapshot: Arc<Snapshot>) {
        let mut cache = self.cache.write().await;
        if let Some(existing) = cache.peek(&profile_id) {
            if existing.version > snapshot.version {
                warn!(
                    profile_id = %profile_id,
                    cached = existing.version,
                    computed = snapshot.version,
                    "Discarding snapshot older than the cached one"
                );
                return;
            }
        }
        debug!(
            profile_id = %profile_id,
            version = snapshot.version,
            last_modified = %snapshot.last_modified,
            parameters = snapshot.parameters.len(),
            "Snapshot published"
        );
        cache.put(profile_id, snapshot);
    }

    /// Precompute snapshots concurrently, returning how many succeeded
    pub async fn warm(&self, profile_ids: &[ProfileId]) -> usize {
        let results = join_all(profile_ids.iter().map(|id| self.snapshot(*id))).await;
        results.iter().filter(|r| r.is_ok()).count()
    }

    /// Cache effectiveness counters
    pub async fn stats(&self) -> PublisherStats {
        PublisherStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            recomputations: self.recomputations.load(Ordering::Relaxed),
            cached: self.cache.read().await.len(),
            tracked_profiles: self
                .markers
                .iter()
                .filter(|entry| matches!(entry.key(), MarkerScope::Profile(_)))
                .count(),
        }
    }

    /// The resolver snapshots are computed with
    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}
