// ABOUTME: Per-profile async mutexes serializing mutations that affect the same profile
// ABOUTME: Multi-profile acquisitions take locks in ascending id order to avoid deadlock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::models::ProfileId;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Guards held for the duration of one mutation
#[must_use = "locks are released as soon as the guard is dropped"]
pub struct ProfileGuards {
    _guards: Vec<OwnedMutexGuard<()>>,
    profiles: Vec<ProfileId>,
}

impl ProfileGuards {
    /// Profiles covered by these guards, ascending
    #[must_use]
    pub fn profiles(&self) -> &[ProfileId] {
        &self.profiles
    }
}

/// Lock table keyed by profile
#[derive(Default)]
pub struct ProfileLocks {
    locks: DashMap<ProfileId, Arc<Mutex<()>>>,
}

impl ProfileLocks {
    /// Create an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, profile_id: ProfileId) -> Arc<Mutex<()>> {
        // Clone the Arc so no map guard is held across an await
        self.locks.entry(profile_id).or_default().value().clone()
    }

    /// Lock every listed profile, in ascending id order
    pub async fn acquire(&self, profile_ids: impl IntoIterator<Item = ProfileId>) -> ProfileGuards {
        let profiles: BTreeSet<ProfileId> = profile_ids.into_iter().collect();
        let mut guards = Vec::with_capacity(profiles.len());
        for profile_id in &profiles {
            guards.push(self.handle(*profile_id).lock_owned().await);
        }
        ProfileGuards {
            _guards: guards,
            profiles: profiles.into_iter().collect(),
        }
    }

    /// Drop the lock entry of a deleted profile
    pub fn remove(&self, profile_id: ProfileId) {
        self.locks.remove(&profile_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_overlapping_sets_serialize() {
        let locks = Arc::new(ProfileLocks::new());
        let held = locks.acquire([ProfileId(2), ProfileId(1)]).await;
        assert_eq!(held.profiles(), &[ProfileId(1), ProfileId(2)]);

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guards = locks.acquire([ProfileId(2), ProfileId(3)]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_sets_do_not_block() {
        let locks = ProfileLocks::new();
        let _first = locks.acquire([ProfileId(1)]).await;
        let second = tokio::time::timeout(Duration::from_secs(1), locks.acquire([ProfileId(2)]))
            .await;
        assert!(second.is_ok());
    }
}
