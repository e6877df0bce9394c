//! Performance benchmarks for engagement ranking and friendship operations.
//!
//! Run with: `cargo bench --bench ranking`

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};
use std::sync::Arc;

use filmgraph_kernel::{
    rank, Account, AccountId, FriendshipGraph, InMemoryDirectory,
    InMemoryRelationshipStore, RankableEntity,
};

/// Entities with a spread of like counts, including many ties.
fn make_entities(n: usize) -> Vec<RankableEntity<usize>> {
    (0..n)
        .map(|id| RankableEntity { id, likes: (id * 7919) % 97 })
        .collect()
}

/// Benchmark ranking across input sizes.
fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");

    for size in [10, 1_000, 100_000] {
        let entities = make_entities(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("top_10", size),
            &entities,
            |b, entities| b.iter(|| rank(black_box(entities), 10)),
        );
        group.bench_with_input(
            BenchmarkId::new("full", size),
            &entities,
            |b, entities| b.iter(|| rank(black_box(entities), size)),
        );
    }

    group.finish();
}

/// Benchmark the request → confirm → remove cycle on the in-memory store.
fn bench_friendship_cycle(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let directory = InMemoryDirectory::new();
    for n in 1..=2 {
        directory.add_account(Account::new(AccountId::new(n), format!("user{n}"), format!("user{n}@example.com")));
    }
    let graph = FriendshipGraph::new(Arc::new(InMemoryRelationshipStore::new()), Arc::new(directory));

    c.bench_function("friendship_cycle", |b| {
        b.iter(|| {
            runtime.block_on(async {
                graph.request(AccountId::new(1), AccountId::new(2)).await.unwrap();
                graph.confirm(AccountId::new(2), AccountId::new(1)).await.unwrap();
                graph.remove(AccountId::new(1), AccountId::new(2)).await.unwrap()
            })
        })
    });
}

/// Benchmark friend listing for a well-connected account.
fn bench_friends_of(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("friends_of");

    for degree in [10_i64, 100, 1_000] {
        let directory = InMemoryDirectory::new();
        for n in 0..=degree {
            directory.add_account(Account::new(AccountId::new(n), format!("user{n}"), format!("user{n}@example.com")));
        }
        let graph = FriendshipGraph::new(Arc::new(InMemoryRelationshipStore::new()), Arc::new(directory));
        runtime.block_on(async {
            for n in 1..=degree {
                graph.request(AccountId::new(0), AccountId::new(n)).await.unwrap();
                graph.confirm(AccountId::new(n), AccountId::new(0)).await.unwrap();
            }
        });

        group.bench_with_input(BenchmarkId::new("degree", degree), &graph, |b, graph| {
            b.iter(|| runtime.block_on(graph.friends_of(black_box(AccountId::new(0)))).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_rank,
    bench_friendship_cycle,
    bench_friends_of,
);
criterion_main!(benches);
