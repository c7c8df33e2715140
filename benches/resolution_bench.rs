// ABOUTME: Criterion benchmarks for profile resolution and snapshot publication
// ABOUTME: Compares cached snapshot reads against full recomputation for growing profiles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for the read path.
//!
//! Measures delivery ordering, a cold resolution through the store, and a warm read
//! served from the snapshot cache, for profiles of increasing size.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use cdn_config_plane::models::{
    AssociationKey, NewParameter, NewProfile, Parameter, ParameterId, ProfileId, ProfileType,
};
use cdn_config_plane::resolver::Resolver;
use cdn_config_plane::snapshot::SnapshotPublisher;
use cdn_config_plane::store::{AssociationStore, InMemoryStore};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;

const PROFILE_SIZES: [usize; 3] = [10, 100, 1_000];

/// Unordered parameters spread over a handful of config files
#[allow(clippy::cast_possible_wrap)]
fn generate_parameters(count: usize) -> Vec<Parameter> {
    (0..count)
        .rev()
        .map(|i| Parameter {
            id: ParameterId(i as i64 + 1),
            name: format!("CONFIG proxy.config.bench.setting_{i}"),
            config_file: format!("file_{}.config", i % 7),
            value: format!("INT {i}"),
            secure: false,
            last_updated: Utc::now(),
        })
        .collect()
}

/// Store with one profile linked to `count` parameters
async fn seeded_store(count: usize) -> (Arc<dyn AssociationStore>, ProfileId) {
    let store: Arc<dyn AssociationStore> = Arc::new(InMemoryStore::new());
    let profile = store
        .create_profile(&NewProfile::new("BENCH_EDGE", ProfileType::EdgeTier))
        .await
        .unwrap();

    let mut keys = Vec::with_capacity(count);
    for i in 0..count {
        let parameter = store
            .create_parameter(&NewParameter::new(
                format!("CONFIG proxy.config.bench.setting_{i}"),
                format!("file_{}.config", i % 7),
                format!("INT {i}"),
            ))
            .await
            .unwrap();
        keys.push(AssociationKey::new(profile.id, parameter.id));
    }
    store.create_associations(&keys).await.unwrap();
    (store, profile.id)
}

/// Benchmark deduplication and delivery ordering
fn bench_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver_order");

    for size in PROFILE_SIZES {
        let parameters = generate_parameters(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &parameters, |b, input| {
            b.iter(|| Resolver::order(black_box(input.clone())));
        });
    }

    group.finish();
}

/// Benchmark a full resolution against a warm cache hit
fn bench_snapshot(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("snapshot");

    for size in PROFILE_SIZES {
        let (store, profile_id) = rt.block_on(seeded_store(size));
        let resolver = Resolver::new(store.clone());
        let publisher = SnapshotPublisher::new(Resolver::new(store), 16);
        rt.block_on(publisher.snapshot(profile_id)).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("recompute", size), &profile_id, |b, id| {
            b.iter(|| rt.block_on(resolver.resolve(black_box(*id))).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("cached", size), &profile_id, |b, id| {
            b.iter(|| rt.block_on(publisher.snapshot(black_box(*id))).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_order, bench_snapshot);
criterion_main!(benches);
