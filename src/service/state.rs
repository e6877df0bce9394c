//! Shared service state.

use std::sync::Arc;

use crate::directory::{AccountDirectory, FilmCatalog};
use crate::engagement::FilmEngagement;
use crate::graph::FriendshipGraph;
use crate::store::RelationshipStore;

/// Shared service state.
///
/// Holds the friendship graph and film engagement over one relationship
/// store and one directory. The directory serves both account lookups and
/// the film catalog.
pub struct ServiceState<S, D> {
    /// Friendship state machine.
    pub graph: FriendshipGraph<S, D>,
    /// Likes and popularity.
    pub engagement: FilmEngagement<D, D>,
    /// Account and film directory.
    pub directory: Arc<D>,
}

impl<S, D> ServiceState<S, D>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    /// Create service state over a store and a directory.
    pub fn new(store: S, directory: D) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(directory))
    }

    /// Create service state from already shared backends.
    pub fn from_shared(store: Arc<S>, directory: Arc<D>) -> Self {
        Self {
            graph: FriendshipGraph::new(store, Arc::clone(&directory)),
            engagement: FilmEngagement::new(Arc::clone(&directory), Arc::clone(&directory)),
            directory,
        }
    }

    /// The relationship store.
    pub fn store(&self) -> &Arc<S> {
        self.graph.store()
    }
}

impl<S, D> Clone for ServiceState<S, D> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            engagement: self.engagement.clone(),
            directory: Arc::clone(&self.directory),
        }
    }
}
