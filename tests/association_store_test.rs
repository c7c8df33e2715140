// ABOUTME: Contract tests for AssociationStore run against the in-memory and SQLite backends
// ABOUTME: Covers uniqueness, referential integrity, cascades, batch atomicity and keyset paging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use cdn_config_plane::errors::{EntityKind, StoreError};
use cdn_config_plane::models::{
    AssociationFilter, AssociationKey, NewParameter, NewProfile, ParameterFilter, ParameterId,
    ProfileId, ProfileType,
};
use cdn_config_plane::pagination::PaginationParams;
use common::{all_stores, parameter, profile};

// ============================================================================
// Associations
// ============================================================================

#[tokio::test]
async fn test_pair_is_unique() {
    for (backend, store) in all_stores().await.unwrap() {
        let p = profile(&store, "EDGE1", ProfileType::EdgeTier).await.unwrap();
        let x = parameter(&store, "location", "storage.config", "/var/trafficserver")
            .await
            .unwrap();
        let key = AssociationKey::new(p.id, x.id);

        let row = store.create_association(key).await.unwrap();
        assert_eq!(row.profile, "EDGE1", "{backend}");
        assert_eq!(row.config_file, "storage.config", "{backend}");

        let err = store.create_association(key).await.unwrap_err();
        assert!(
            matches!(err, StoreError::AssociationExists { .. }),
            "{backend}: {err:?}"
        );
        assert_eq!(store.list_by_profile(p.id).await.unwrap().len(), 1, "{backend}");
    }
}

#[tokio::test]
async fn test_pair_requires_both_entities() {
    for (backend, store) in all_stores().await.unwrap() {
        let p = profile(&store, "EDGE1", ProfileType::EdgeTier).await.unwrap();

        let err = store
            .create_association(AssociationKey::new(p.id, ParameterId(99)))
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                StoreError::MissingReference {
                    entity: EntityKind::Parameter,
                    id: 99
                }
            ),
            "{backend}: {err:?}"
        );
        assert!(store.list_by_profile(p.id).await.unwrap().is_empty(), "{backend}");
    }
}

#[tokio::test]
async fn test_batch_with_one_bad_pair_writes_nothing() {
    for (backend, store) in all_stores().await.unwrap() {
        let p1 = profile(&store, "P1", ProfileType::EdgeTier).await.unwrap();
        let p2 = profile(&store, "P2", ProfileType::MidTier).await.unwrap();
        let x = parameter(&store, "X", "records.config", "1").await.unwrap();
        let y = parameter(&store, "Y", "records.config", "2").await.unwrap();
        store
            .create_association(AssociationKey::new(p1.id, x.id))
            .await
            .unwrap();

        let err = store
            .create_associations(&[
                AssociationKey::new(p2.id, y.id),
                AssociationKey::new(p1.id, x.id),
            ])
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::AssociationExists { .. }),
            "{backend}: {err:?}"
        );
        assert!(
            !store
                .association_exists(AssociationKey::new(p2.id, y.id))
                .await
                .unwrap(),
            "{backend}: (P2, Y) must not be written"
        );
    }
}

#[tokio::test]
async fn test_repeated_pair_within_batch_is_rejected() {
    for (backend, store) in all_stores().await.unwrap() {
        let p = profile(&store, "P1", ProfileType::EdgeTier).await.unwrap();
        let x = parameter(&store, "X", "records.config", "1").await.unwrap();
        let key = AssociationKey::new(p.id, x.id);

        assert!(
            store.create_associations(&[key, key]).await.is_err(),
            "{backend}"
        );
        assert!(!store.association_exists(key).await.unwrap(), "{backend}");
    }
}

#[tokio::test]
async fn test_delete_absent_pair_is_not_found() {
    for (backend, store) in all_stores().await.unwrap() {
        let err = store
            .delete_association(AssociationKey::new(ProfileId(7), ParameterId(42)))
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                StoreError::AssociationNotFound {
                    profile_id: 7,
                    parameter_id: 42
                }
            ),
            "{backend}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_list_by_profile_and_parameter() {
    for (backend, store) in all_stores().await.unwrap() {
        let p1 = profile(&store, "P1", ProfileType::EdgeTier).await.unwrap();
        let p2 = profile(&store, "P2", ProfileType::EdgeTier).await.unwrap();
        let x = parameter(&store, "X", "a.config", "1").await.unwrap();
        let y = parameter(&store, "Y", "a.config", "2").await.unwrap();
        store
            .create_associations(&[
                AssociationKey::new(p1.id, y.id),
                AssociationKey::new(p1.id, x.id),
                AssociationKey::new(p2.id, x.id),
            ])
            .await
            .unwrap();

        let by_profile: Vec<_> = store
            .list_by_profile(p1.id)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.parameter_id)
            .collect();
        assert_eq!(by_profile, vec![x.id, y.id], "{backend}");

        let by_parameter: Vec<_> = store
            .list_by_parameter(x.id)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.profile_id)
            .collect();
        assert_eq!(by_parameter, vec![p1.id, p2.id], "{backend}");
    }
}

#[tokio::test]
async fn test_keyset_pages_cover_every_row_once() {
    for (backend, store) in all_stores().await.unwrap() {
        let mut keys = Vec::new();
        for i in 0..3 {
            let p = profile(&store, &format!("P{i}"), ProfileType::EdgeTier)
                .await
                .unwrap();
            for j in 0..3 {
                let x = parameter(&store, &format!("N{i}{j}"), "a.config", "v")
                    .await
                    .unwrap();
                keys.push(AssociationKey::new(p.id, x.id));
            }
        }
        store.create_associations(&keys).await.unwrap();

        let mut seen = Vec::new();
        let mut after = None;
        loop {
            let page = store
                .list_associations(
                    AssociationFilter::default(),
                    PaginationParams { after, limit: 4 },
                )
                .await
                .unwrap();
            seen.extend(page.items.iter().map(|row| row.key()));
            match page.next_cursor {
                Some(cursor) => after = cursor.decode(),
                None => break,
            }
        }
        keys.sort();
        assert_eq!(seen, keys, "{backend}");
    }
}

#[tokio::test]
async fn test_listing_filters_by_parameter() {
    for (backend, store) in all_stores().await.unwrap() {
        let p1 = profile(&store, "P1", ProfileType::EdgeTier).await.unwrap();
        let p2 = profile(&store, "P2", ProfileType::EdgeTier).await.unwrap();
        let x = parameter(&store, "X", "a.config", "1").await.unwrap();
        let y = parameter(&store, "Y", "a.config", "2").await.unwrap();
        store
            .create_associations(&[
                AssociationKey::new(p1.id, x.id),
                AssociationKey::new(p1.id, y.id),
                AssociationKey::new(p2.id, y.id),
            ])
            .await
            .unwrap();

        let page = store
            .list_associations(
                AssociationFilter {
                    profile_id: None,
                    parameter_id: Some(y.id),
                },
                PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.count, 2, "{backend}");
        assert!(page.items.iter().all(|row| row.parameter_id == y.id), "{backend}");
        assert!(!page.has_more, "{backend}");
    }
}

// ============================================================================
// Entities and cascades
// ============================================================================

#[tokio::test]
async fn test_profile_names_are_unique() {
    for (backend, store) in all_stores().await.unwrap() {
        profile(&store, "MID1", ProfileType::MidTier).await.unwrap();
        let err = store
            .create_profile(&NewProfile::new("MID1", ProfileType::EdgeTier))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }), "{backend}: {err:?}");
    }
}

#[tokio::test]
async fn test_parameter_triple_is_unique() {
    for (backend, store) in all_stores().await.unwrap() {
        parameter(&store, "CONFIG proxy.config.admin.user_id", "records.config", "STRING ats")
            .await
            .unwrap();
        let err = store
            .create_parameter(&NewParameter::new(
                "CONFIG proxy.config.admin.user_id",
                "records.config",
                "STRING ats",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }), "{backend}: {err:?}");

        // Same name and file with another value is a distinct parameter
        parameter(&store, "CONFIG proxy.config.admin.user_id", "records.config", "STRING root")
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_deleting_profile_cascades_associations() {
    for (backend, store) in all_stores().await.unwrap() {
        let p = profile(&store, "P1", ProfileType::EdgeTier).await.unwrap();
        let x = parameter(&store, "X", "a.config", "1").await.unwrap();
        store
            .create_association(AssociationKey::new(p.id, x.id))
            .await
            .unwrap();

        store.delete_profile(p.id).await.unwrap();
        assert!(store.list_by_parameter(x.id).await.unwrap().is_empty(), "{backend}");
        assert!(store.get_profile(p.id).await.unwrap().is_none(), "{backend}");
        assert!(store.get_parameter(x.id).await.unwrap().is_some(), "{backend}");
    }
}

#[tokio::test]
async fn test_deleting_parameter_cascades_and_reports_profiles() {
    for (backend, store) in all_stores().await.unwrap() {
        let p1 = profile(&store, "P1", ProfileType::EdgeTier).await.unwrap();
        let p2 = profile(&store, "P2", ProfileType::EdgeTier).await.unwrap();
        let x = parameter(&store, "X", "a.config", "1").await.unwrap();
        store
            .create_associations(&[
                AssociationKey::new(p1.id, x.id),
                AssociationKey::new(p2.id, x.id),
            ])
            .await
            .unwrap();

        let affected = store.delete_parameter(x.id).await.unwrap();
        assert_eq!(affected, vec![p1.id, p2.id], "{backend}");
        assert!(store.list_by_profile(p1.id).await.unwrap().is_empty(), "{backend}");
        assert!(store.list_by_profile(p2.id).await.unwrap().is_empty(), "{backend}");
    }
}

#[tokio::test]
async fn test_profile_with_servers_cannot_be_deleted() {
    for (backend, store) in all_stores().await.unwrap() {
        let p = profile(&store, "EDGE1", ProfileType::EdgeTier).await.unwrap();
        let server = store.create_server("edge-01.cdn.local", p.id).await.unwrap();

        let err = store.delete_profile(p.id).await.unwrap_err();
        assert!(matches!(err, StoreError::InUse { .. }), "{backend}: {err:?}");

        store.delete_server(server.id).await.unwrap();
        store.delete_profile(p.id).await.unwrap();
    }
}

#[tokio::test]
async fn test_server_requires_profile_and_unique_host() {
    for (backend, store) in all_stores().await.unwrap() {
        let err = store
            .create_server("edge-01", ProfileId(5))
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::MissingReference { .. }),
            "{backend}: {err:?}"
        );

        let p = profile(&store, "EDGE1", ProfileType::EdgeTier).await.unwrap();
        store.create_server("edge-01", p.id).await.unwrap();
        let err = store.create_server("edge-01", p.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }), "{backend}: {err:?}");

        let found = store.get_server_by_host("edge-01").await.unwrap().unwrap();
        assert_eq!(found.profile_id, p.id, "{backend}");
    }
}

#[tokio::test]
async fn test_parameter_update_reports_referencing_profiles() {
    for (backend, store) in all_stores().await.unwrap() {
        let p = profile(&store, "P1", ProfileType::EdgeTier).await.unwrap();
        let x = parameter(&store, "X", "a.config", "1").await.unwrap();
        store
            .create_association(AssociationKey::new(p.id, x.id))
            .await
            .unwrap();

        let (updated, profiles) = store
            .update_parameter(x.id, &NewParameter::new("X", "a.config", "2"))
            .await
            .unwrap();
        assert_eq!(updated.value, "2", "{backend}");
        assert_eq!(profiles, vec![p.id], "{backend}");

        let filtered = store
            .list_parameters(&ParameterFilter {
                value: Some("2".to_owned()),
                ..ParameterFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1, "{backend}");
    }
}

#[tokio::test]
async fn test_profile_with_parameters_reads_atomically() {
    for (backend, store) in all_stores().await.unwrap() {
        assert!(
            store
                .profile_with_parameters(ProfileId(1))
                .await
                .unwrap()
                .is_none(),
            "{backend}"
        );

        let p = profile(&store, "P1", ProfileType::EdgeTier).await.unwrap();
        let x = parameter(&store, "X", "a.config", "1").await.unwrap();
        store
            .create_association(AssociationKey::new(p.id, x.id))
            .await
            .unwrap();

        let (found, parameters) = store.profile_with_parameters(p.id).await.unwrap().unwrap();
        assert_eq!(found.name, "P1", "{backend}");
        assert_eq!(parameters.len(), 1, "{backend}");
        assert_eq!(parameters[0].id, x.id, "{backend}");
    }
}

#[tokio::test]
async fn test_sqlite_file_store_persists_across_reopen() {
    use cdn_config_plane::config::DatabaseUrl;
    use cdn_config_plane::store::{AssociationStore, SqliteStore};

    let dir = tempfile::tempdir().unwrap();
    let url = DatabaseUrl::Sqlite {
        path: dir.path().join("nested").join("cdn.db"),
    };

    let key = {
        let store = SqliteStore::open(&url, 2).await.unwrap();
        let p = store
            .create_profile(&NewProfile::new("P1", ProfileType::EdgeTier))
            .await
            .unwrap();
        let x = store
            .create_parameter(&NewParameter::new("X", "a.config", "1"))
            .await
            .unwrap();
        let key = AssociationKey::new(p.id, x.id);
        store.create_association(key).await.unwrap();
        key
    };

    let reopened = SqliteStore::open(&url, 2).await.unwrap();
    assert!(reopened.association_exists(key).await.unwrap());
}
