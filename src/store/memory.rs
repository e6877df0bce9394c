//! In-memory relationship store for testing.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

use super::{KeyMismatch, PairMutation, RelationshipStore};
use crate::types::{AccountId, PairKey, RelationshipEdge};

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// A decided record does not belong to the pair being updated.
    #[error(transparent)]
    KeyMismatch(#[from] KeyMismatch),
}

#[derive(Debug, Default)]
struct State {
    /// Records by pair.
    records: BTreeMap<PairKey, RelationshipEdge>,
    /// Confirmed adjacency, kept in step with `records`.
    friends: BTreeMap<AccountId, BTreeSet<AccountId>>,
}

impl State {
    fn unlink(&mut self, key: &PairKey) {
        for (a, b) in [(key.low(), key.high()), (key.high(), key.low())] {
            if let Some(set) = self.friends.get_mut(&a) {
                set.remove(&b);
                if set.is_empty() {
                    self.friends.remove(&a);
                }
            }
        }
    }

    fn link(&mut self, key: &PairKey) {
        self.friends.entry(key.low()).or_default().insert(key.high());
        self.friends.entry(key.high()).or_default().insert(key.low());
    }

    fn apply(&mut self, key: PairKey, mutation: &PairMutation) {
        match mutation {
            PairMutation::Unchanged => {}
            PairMutation::Upsert(edge) => {
                if edge.is_confirmed() {
                    self.link(&key);
                } else {
                    self.unlink(&key);
                }
                self.records.insert(key, edge.clone());
            }
            PairMutation::Delete => {
                self.unlink(&key);
                self.records.remove(&key);
            }
        }
    }
}

/// In-memory relationship store.
///
/// A single `RwLock` guards the records and the confirmed adjacency index,
/// so every update is serialized and readers never see the two disagree.
#[derive(Debug, Default)]
pub struct InMemoryRelationshipStore {
    state: RwLock<State>,
}

impl InMemoryRelationshipStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of records (pending and confirmed).
    pub fn num_relationships(&self) -> usize {
        self.state.read().records.len()
    }

    /// Get all records, ordered by pair.
    pub fn all_relationships(&self) -> Vec<RelationshipEdge> {
        self.state.read().records.values().cloned().collect()
    }
}

#[async_trait]
impl RelationshipStore for InMemoryRelationshipStore {
    type Error = InMemoryError;

    async fn get_relationship(&self, key: &PairKey) -> Result<Option<RelationshipEdge>, Self::Error> {
        Ok(self.state.read().records.get(key).cloned())
    }

    async fn update_relationship<F, E>(
        &self,
        key: PairKey,
        decide: F,
    ) -> Result<Result<PairMutation, E>, Self::Error>
    where
        F: FnOnce(Option<&RelationshipEdge>) -> Result<PairMutation, E> + Send,
        E: Send,
    {
        let mut state = self.state.write();

        let mutation = match decide(state.records.get(&key)) {
            Ok(mutation) => mutation,
            Err(e) => return Ok(Err(e)),
        };

        mutation.check_key(key)?;
        state.apply(key, &mutation);
        Ok(Ok(mutation))
    }

    async fn confirmed_partners(&self, id: &AccountId) -> Result<BTreeSet<AccountId>, Self::Error> {
        Ok(self.state
            .read()
            .friends
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn pending_requests_to(&self, id: &AccountId) -> Result<Vec<RelationshipEdge>, Self::Error> {
        let mut pending: Vec<RelationshipEdge> = self.state
            .read()
            .records
            .values()
            .filter(|edge| !edge.is_confirmed() && edge.target == *id)
            .cloned()
            .collect();

        pending.sort_by_key(|edge| edge.requester);
        Ok(pending)
    }
}
