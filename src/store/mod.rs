//! Relationship storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::types::{AccountId, PairKey, RelationshipEdge};

/// Pool statistics for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// A decided record does not belong to the pair being updated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Record for {found:?} written under pair {expected}")]
pub struct KeyMismatch {
    /// Pair that was locked.
    pub expected: PairKey,
    /// Pair the record belongs to (`None` for a self-referencing record).
    pub found: Option<PairKey>,
}

/// Write decided for a pair inside [`RelationshipStore::update_relationship`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairMutation {
    /// Leave the pair as it is.
    Unchanged,
    /// Insert or replace the pair's record.
    Upsert(RelationshipEdge),
    /// Delete the pair's record.
    Delete,
}

impl PairMutation {
    /// Check that an upserted record belongs to `key`.
    ///
    /// Backends call this before writing so a mismatched record is
    /// rejected the same way everywhere.
    pub fn check_key(&self, key: PairKey) -> Result<(), KeyMismatch> {
        match self {
            PairMutation::Upsert(edge) if edge.key() != Some(key) => Err(KeyMismatch {
                expected: key,
                found: edge.key(),
            }),
            _ => Ok(()),
        }
    }
}

/// Trait for relationship storage backends.
///
/// A backend holds at most one record per [`PairKey`]. All mutations go
/// through `update_relationship`, which must run read, decision and write
/// as one atomic step with respect to other mutations of the same pair.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Fetch the record for a pair.
    async fn get_relationship(&self, key: &PairKey) -> Result<Option<RelationshipEdge>, Self::Error>;

    /// Atomically read the pair's record, let `decide` choose a mutation and apply it.
    ///
    /// The outer result carries backend failures. The inner result is
    /// whatever `decide` returned; on `Err` nothing is written.
    async fn update_relationship<F, E>(
        &self,
        key: PairKey,
        decide: F,
    ) -> Result<Result<PairMutation, E>, Self::Error>
    where
        F: FnOnce(Option<&RelationshipEdge>) -> Result<PairMutation, E> + Send,
        E: Send;

    /// Accounts with a confirmed relationship to `id` (ordered by AccountId).
    async fn confirmed_partners(&self, id: &AccountId) -> Result<BTreeSet<AccountId>, Self::Error>;

    /// Pending records whose target is `id` (ordered by requester).
    async fn pending_requests_to(&self, id: &AccountId) -> Result<Vec<RelationshipEdge>, Self::Error>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Connection pool statistics, for backends that pool connections.
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

pub use memory::{InMemoryError, InMemoryRelationshipStore};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresError, PostgresRelationshipStore};
