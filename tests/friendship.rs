//! Integration tests for the friendship lifecycle.
//!
//! These tests drive `FriendshipGraph` over the in-memory backends and check
//! symmetry and one-record-per-pair under arbitrary operation sequences and
//! concurrent callers.

use std::collections::BTreeSet;
use std::sync::Arc;

use filmgraph_kernel::{
    Account, AccountId, FriendshipError, FriendshipGraph, InMemoryDirectory,
    InMemoryRelationshipStore, RelationshipStatus, Removal,
};
use proptest::prelude::*;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

type Graph = FriendshipGraph<InMemoryRelationshipStore, InMemoryDirectory>;

fn id(n: i64) -> AccountId {
    AccountId::new(n)
}

fn build_graph(accounts: i64) -> Graph {
    let directory = InMemoryDirectory::new();
    for n in 1..=accounts {
        directory.add_account(Account::new(id(n), format!("user{n}"), format!("user{n}@example.com")));
    }
    FriendshipGraph::new(Arc::new(InMemoryRelationshipStore::new()), Arc::new(directory))
}

async fn assert_symmetric(graph: &Graph, accounts: i64) {
    for a in 1..=accounts {
        let friends_a = graph.friends_of(id(a)).await.unwrap();
        assert!(!friends_a.contains(&id(a)), "{a} is listed as its own friend");
        for b in friends_a {
            let friends_b = graph.friends_of(b).await.unwrap();
            assert!(friends_b.contains(&id(a)), "{a} lists {b} but not the reverse");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_lifecycle() {
    let graph = build_graph(3);

    graph.request(id(1), id(2)).await.unwrap();
    assert!(graph.friends_of(id(1)).await.unwrap().is_empty());
    assert!(graph.friends_of(id(2)).await.unwrap().is_empty());

    let incoming = graph.incoming_requests(id(2)).await.unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].requester, id(1));

    graph.confirm(id(2), id(1)).await.unwrap();
    assert_eq!(graph.friends_of(id(1)).await.unwrap(), BTreeSet::from([id(2)]));
    assert_eq!(graph.friends_of(id(2)).await.unwrap(), BTreeSet::from([id(1)]));
    assert!(graph.incoming_requests(id(2)).await.unwrap().is_empty());

    let edge = graph.relationship(id(2), id(1)).await.unwrap().unwrap();
    assert_eq!(edge.status, RelationshipStatus::Confirmed);
    assert_eq!(edge.requester, id(1));

    assert_eq!(graph.remove(id(2), id(1)).await.unwrap(), Removal::Removed);
    assert!(graph.friends_of(id(1)).await.unwrap().is_empty());
    assert!(graph.friends_of(id(2)).await.unwrap().is_empty());
    assert_eq!(graph.remove(id(1), id(2)).await.unwrap(), Removal::NotRelated);

    assert_eq!(graph.store().num_relationships(), 0);
}

#[tokio::test]
async fn test_common_friends_scenario() {
    let graph = build_graph(4);

    for (a, b) in [(1, 3), (2, 3), (1, 4)] {
        graph.request(id(a), id(b)).await.unwrap();
        graph.confirm(id(b), id(a)).await.unwrap();
    }

    assert_eq!(graph.common_friends(id(1), id(2)).await.unwrap(), BTreeSet::from([id(3)]));
    assert_eq!(graph.common_friends(id(2), id(1)).await.unwrap(), BTreeSet::from([id(3)]));
    assert!(graph.common_friends(id(3), id(4)).await.unwrap().contains(&id(1)));
}

#[tokio::test]
async fn test_reverse_request_while_pending_is_rejected() {
    let graph = build_graph(2);

    graph.request(id(1), id(2)).await.unwrap();
    assert_eq!(
        graph.request(id(2), id(1)).await,
        Err(FriendshipError::AlreadyRequested { requester: id(1), target: id(2) })
    );
    assert_eq!(graph.store().num_relationships(), 1);
}

#[tokio::test]
async fn test_requester_cannot_confirm_own_request() {
    let graph = build_graph(2);

    graph.request(id(1), id(2)).await.unwrap();
    assert_eq!(
        graph.confirm(id(1), id(2)).await,
        Err(FriendshipError::NoSuchPendingRequest { requester: id(2), confirmer: id(1) })
    );
}

#[tokio::test]
async fn test_missing_account_leaves_no_record() {
    let graph = build_graph(2);

    assert_eq!(graph.request(id(1), id(99)).await, Err(FriendshipError::AccountNotFound(id(99))));
    assert_eq!(graph.friends_of(id(99)).await, Err(FriendshipError::AccountNotFound(id(99))));
    assert_eq!(graph.store().num_relationships(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_requests_create_one_record() {
    for _ in 0..20 {
        let graph = build_graph(2);

        let mut handles = Vec::new();
        for i in 0..16 {
            let graph = graph.clone();
            let (a, b) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
            handles.push(tokio::spawn(async move { graph.request(id(a), id(b)).await }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(FriendshipError::AlreadyRequested { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(graph.store().num_relationships(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_confirm_and_remove_stay_consistent() {
    for _ in 0..20 {
        let graph = build_graph(2);
        graph.request(id(1), id(2)).await.unwrap();

        let confirm = {
            let graph = graph.clone();
            tokio::spawn(async move { graph.confirm(id(2), id(1)).await })
        };
        let remove = {
            let graph = graph.clone();
            tokio::spawn(async move { graph.remove(id(1), id(2)).await })
        };

        let confirmed = confirm.await.unwrap();
        let removed = remove.await.unwrap().unwrap();
        assert_eq!(removed, Removal::Removed);

        // Whichever ran first, the pair ends with no record.
        assert_eq!(graph.store().num_relationships(), 0);
        assert_symmetric(&graph, 2).await;
        if let Err(e) = confirmed {
            assert_eq!(e, FriendshipError::NoSuchPendingRequest { requester: id(1), confirmer: id(2) });
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_request_and_remove_stay_consistent() {
    for _ in 0..50 {
        let graph = build_graph(2);

        let request = {
            let graph = graph.clone();
            tokio::spawn(async move { graph.request(id(1), id(2)).await })
        };
        let remove = {
            let graph = graph.clone();
            tokio::spawn(async move { graph.remove(id(2), id(1)).await })
        };

        request.await.unwrap().unwrap();
        let removal = remove.await.unwrap().unwrap();

        match removal {
            // Remove ran after the request and cleared it.
            Removal::Removed => assert_eq!(graph.store().num_relationships(), 0),
            // Remove ran first; the request stands alone.
            Removal::NotRelated => {
                let edges = graph.store().all_relationships();
                assert_eq!(edges.len(), 1);
                assert_eq!(edges[0].requester, id(1));
                assert_eq!(edges[0].target, id(2));
                assert_eq!(edges[0].status, RelationshipStatus::Pending);
            }
        }
        assert_symmetric(&graph, 2).await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

const ACCOUNTS: i64 = 4;

#[derive(Debug, Clone)]
enum Op {
    Request(i64, i64),
    Confirm(i64, i64),
    Remove(i64, i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let pair = (1..=ACCOUNTS, 1..=ACCOUNTS);
    prop_oneof![
        pair.clone().prop_map(|(a, b)| Op::Request(a, b)),
        pair.clone().prop_map(|(a, b)| Op::Confirm(a, b)),
        pair.prop_map(|(a, b)| Op::Remove(a, b)),
    ]
}

async fn apply(graph: &Graph, op: &Op) {
    // Rejections are expected; only the resulting state matters.
    let _ = match *op {
        Op::Request(a, b) => graph.request(id(a), id(b)).await.map(|_| ()),
        Op::Confirm(a, b) => graph.confirm(id(a), id(b)).await.map(|_| ()),
        Op::Remove(a, b) => graph.remove(id(a), id(b)).await.map(|_| ()),
    };
}

proptest! {
    /// Property: confirmed friendship is symmetric after any sequence
    #[test]
    fn test_friendship_is_symmetric(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let graph = build_graph(ACCOUNTS);
            for op in &ops {
                apply(&graph, op).await;
                assert_symmetric(&graph, ACCOUNTS).await;
            }

            // At most one record per unordered pair.
            let pairs = (ACCOUNTS * (ACCOUNTS - 1) / 2) as usize;
            assert!(graph.store().num_relationships() <= pairs);
            let keys: BTreeSet<_> = graph.store()
                .all_relationships()
                .iter()
                .filter_map(|edge| edge.key())
                .collect();
            assert_eq!(keys.len(), graph.store().num_relationships());
        });
    }

    /// Property: common friends do not depend on argument order
    #[test]
    fn test_common_friends_commutative(
        ops in prop::collection::vec(op_strategy(), 0..40),
        a in 1..=ACCOUNTS,
        b in 1..=ACCOUNTS,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (ab, ba) = rt.block_on(async {
            let graph = build_graph(ACCOUNTS);
            for op in &ops {
                apply(&graph, op).await;
            }
            (
                graph.common_friends(id(a), id(b)).await.unwrap(),
                graph.common_friends(id(b), id(a)).await.unwrap(),
            )
        });
        prop_assert_eq!(ab, ba);
    }

    /// Property: a second remove never changes anything
    #[test]
    fn test_remove_is_idempotent(
        ops in prop::collection::vec(op_strategy(), 0..40),
        a in 1..=ACCOUNTS,
        b in 1..=ACCOUNTS,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (second, remaining) = rt.block_on(async {
            let graph = build_graph(ACCOUNTS);
            for op in &ops {
                apply(&graph, op).await;
            }
            graph.remove(id(a), id(b)).await.unwrap();
            let before = graph.store().num_relationships();
            let second = graph.remove(id(a), id(b)).await.unwrap();
            (second, (before, graph.store().num_relationships()))
        });
        prop_assert_eq!(second, Removal::NotRelated);
        prop_assert_eq!(remaining.0, remaining.1);
    }
}
