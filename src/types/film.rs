//! Film types and like-sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::account::AccountId;

/// Unique identifier for a film in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilmId(i64);

impl FilmId {
    /// Create a new FilmId.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw key.
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for FilmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for FilmId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Set of accounts that liked an entity.
///
/// Membership is the only state: liking twice or unliking an absent
/// account leaves the set (and its count) unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikeSet(BTreeSet<AccountId>);

impl LikeSet {
    /// Create an empty like-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a like. Returns `true` if the account had not liked yet.
    pub fn insert(&mut self, account: AccountId) -> bool {
        self.0.insert(account)
    }

    /// Remove a like. Returns `true` if the account had liked.
    pub fn remove(&mut self, account: &AccountId) -> bool {
        self.0.remove(account)
    }

    /// Whether the account has liked.
    pub fn contains(&self, account: &AccountId) -> bool {
        self.0.contains(account)
    }

    /// Engagement count.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nobody has liked.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate likers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.0.iter()
    }
}

impl FromIterator<AccountId> for LikeSet {
    fn from_iter<I: IntoIterator<Item = AccountId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Film record as held by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    /// Film identifier.
    pub id: FilmId,
    /// Title.
    pub name: String,
    /// Accounts that liked this film.
    #[serde(default)]
    pub likes: LikeSet,
}

impl Film {
    /// Create a film with no likes.
    pub fn new(id: FilmId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            likes: LikeSet::new(),
        }
    }

    /// Replace the like-set.
    pub fn with_likes(mut self, likes: impl IntoIterator<Item = AccountId>) -> Self {
        self.likes = likes.into_iter().collect();
        self
    }

    /// Record a like. No-op if already present.
    pub fn add_like(&mut self, account: AccountId) -> bool {
        self.likes.insert(account)
    }

    /// Withdraw a like. No-op if absent.
    pub fn remove_like(&mut self, account: &AccountId) -> bool {
        self.likes.remove(account)
    }

    /// Number of distinct accounts that liked this film.
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_like_is_noop() {
        let mut film = Film::new(FilmId::new(1), "Stalker");
        let user = AccountId::new(7);

        assert!(film.add_like(user));
        assert!(!film.add_like(user));
        assert_eq!(film.like_count(), 1);
    }

    #[test]
    fn test_remove_absent_like_is_noop() {
        let mut film = Film::new(FilmId::new(1), "Solaris").with_likes([AccountId::new(1)]);

        assert!(!film.remove_like(&AccountId::new(2)));
        assert_eq!(film.like_count(), 1);
        assert!(film.remove_like(&AccountId::new(1)));
        assert!(film.likes.is_empty());
    }

    #[test]
    fn test_like_set_serializes_as_array() {
        let likes: LikeSet = [AccountId::new(3), AccountId::new(1)].into_iter().collect();
        assert_eq!(serde_json::to_string(&likes).unwrap(), "[1,3]");
    }
}
