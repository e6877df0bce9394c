//! Friendship state machine.
//!
//! Runs the request → confirm → remove lifecycle over a
//! [`RelationshipStore`], validating participants through an
//! [`AccountDirectory`].
//!
//! ## State machine (per unordered pair)
//!
//! ```text
//! None ──request(a,b)──▶ Pending(a→b) ──confirm(b,a)──▶ Confirmed
//!   ▲                         │                             │
//!   └────────remove(a,b) / remove(b,a)──────────────────────┘
//! ```
//!
//! Every transition is decided inside `RelationshipStore::update_relationship`,
//! so racing callers on the same pair observe one serial order.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::directory::AccountDirectory;
use crate::store::{PairMutation, RelationshipStore};
use crate::types::{AccountId, PairKey, RelationshipEdge, RelationshipStatus};

/// Error type for friendship operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FriendshipError {
    /// Referenced account is absent from the directory.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),
    /// Both sides of the operation are the same account.
    #[error("Account {0} cannot befriend itself")]
    SelfRelationship(AccountId),
    /// A pending request already links the pair.
    #[error("Friend request already pending between {requester} and {target}")]
    AlreadyRequested {
        /// Requester of the existing pending record.
        requester: AccountId,
        /// Target of the existing pending record.
        target: AccountId,
    },
    /// The pair is already confirmed friends.
    #[error("Accounts {0} and {1} are already friends")]
    AlreadyRelated(AccountId, AccountId),
    /// No pending request from `requester` to `confirmer`.
    #[error("No pending friend request from {requester} to {confirmer}")]
    NoSuchPendingRequest {
        /// Account expected to have sent the request.
        requester: AccountId,
        /// Account attempting to confirm.
        confirmer: AccountId,
    },
    /// Relationship store failure.
    #[error("Store error: {0}")]
    Store(String),
    /// Directory failure.
    #[error("Directory error: {0}")]
    Directory(String),
}

impl FriendshipError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }

    /// Create a directory error from any error type.
    pub fn from_directory<E: std::error::Error>(e: E) -> Self {
        Self::Directory(e.to_string())
    }
}

/// Outcome of a successful `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// A pending or confirmed record was deleted.
    Removed,
    /// There was nothing to delete.
    NotRelated,
}

/// Friendship graph over a relationship store.
pub struct FriendshipGraph<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
}

impl<S, D> Clone for FriendshipGraph<S, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<S, D> FriendshipGraph<S, D>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + 'static,
{
    /// Create a graph over the given store and account directory.
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self { store, directory }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Underlying account directory.
    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    async fn ensure_account(&self, id: &AccountId) -> Result<(), FriendshipError> {
        let exists = self.directory
            .exists(id)
            .await
            .map_err(FriendshipError::from_directory)?;

        if exists {
            Ok(())
        } else {
            Err(FriendshipError::AccountNotFound(*id))
        }
    }

    /// Send a friend request from `requester` to `target`.
    ///
    /// Fails if either account is missing, if they are the same account,
    /// or if any record already links the pair (in either direction).
    pub async fn request(&self, requester: AccountId, target: AccountId) -> Result<(), FriendshipError> {
        self.ensure_account(&requester).await?;
        self.ensure_account(&target).await?;

        let key = PairKey::new(requester, target)
            .ok_or(FriendshipError::SelfRelationship(requester))?;

        let now = Utc::now();
        self.store
            .update_relationship(key, |current| match current {
                None => Ok(PairMutation::Upsert(RelationshipEdge::pending(requester, target, now))),
                Some(edge) => Err(match edge.status {
                    RelationshipStatus::Pending => FriendshipError::AlreadyRequested {
                        requester: edge.requester,
                        target: edge.target,
                    },
                    RelationshipStatus::Confirmed => FriendshipError::AlreadyRelated(requester, target),
                }),
            })
            .await
            .map_err(FriendshipError::from_store)??;

        info!(requester = %requester, target = %target, "Friend request created");
        Ok(())
    }

    /// Confirm the pending request that `requester` sent to `confirmer`.
    ///
    /// The single pair record flips to `Confirmed`, so both directions
    /// become visible together.
    pub async fn confirm(&self, confirmer: AccountId, requester: AccountId) -> Result<(), FriendshipError> {
        self.ensure_account(&confirmer).await?;
        self.ensure_account(&requester).await?;

        let no_request = FriendshipError::NoSuchPendingRequest { requester, confirmer };
        let key = PairKey::new(requester, confirmer).ok_or_else(|| no_request.clone())?;

        let now = Utc::now();
        self.store
            .update_relationship(key, |current| match current {
                Some(edge) if edge.awaits(&requester, &confirmer) => {
                    Ok(PairMutation::Upsert(edge.confirmed(now)))
                }
                _ => Err(no_request),
            })
            .await
            .map_err(FriendshipError::from_store)??;

        info!(confirmer = %confirmer, requester = %requester, "Friendship confirmed");
        Ok(())
    }

    /// Remove any relationship between `a` and `b`.
    ///
    /// Removing a relationship that does not exist succeeds with
    /// [`Removal::NotRelated`].
    pub async fn remove(&self, a: AccountId, b: AccountId) -> Result<Removal, FriendshipError> {
        self.ensure_account(&a).await?;
        self.ensure_account(&b).await?;

        let Some(key) = PairKey::new(a, b) else {
            debug!(account = %a, "Remove on self pair is a no-op");
            return Ok(Removal::NotRelated);
        };

        let mutation = self.store
            .update_relationship(key, |current| {
                Ok::<_, FriendshipError>(match current {
                    Some(_) => PairMutation::Delete,
                    None => PairMutation::Unchanged,
                })
            })
            .await
            .map_err(FriendshipError::from_store)??;

        if mutation == PairMutation::Delete {
            info!(a = %a, b = %b, "Relationship removed");
            Ok(Removal::Removed)
        } else {
            debug!(a = %a, b = %b, "No relationship to remove");
            Ok(Removal::NotRelated)
        }
    }

    /// Accounts with a confirmed relationship to `account`.
    pub async fn friends_of(&self, account: AccountId) -> Result<BTreeSet<AccountId>, FriendshipError> {
        self.ensure_account(&account).await?;

        self.store
            .confirmed_partners(&account)
            .await
            .map_err(FriendshipError::from_store)
    }

    /// Friends shared by `a` and `b`.
    pub async fn common_friends(&self, a: AccountId, b: AccountId) -> Result<BTreeSet<AccountId>, FriendshipError> {
        let friends_a = self.friends_of(a).await?;
        let friends_b = self.friends_of(b).await?;

        Ok(friends_a.intersection(&friends_b).copied().collect())
    }

    /// Pending requests awaiting confirmation by `account`.
    pub async fn incoming_requests(&self, account: AccountId) -> Result<Vec<RelationshipEdge>, FriendshipError> {
        self.ensure_account(&account).await?;

        self.store
            .pending_requests_to(&account)
            .await
            .map_err(FriendshipError::from_store)
    }

    /// Current record between `a` and `b`, if any.
    pub async fn relationship(&self, a: AccountId, b: AccountId) -> Result<Option<RelationshipEdge>, FriendshipError> {
        let Some(key) = PairKey::new(a, b) else {
            return Ok(None);
        };

        self.store
            .get_relationship(&key)
            .await
            .map_err(FriendshipError::from_store)
    }
}
