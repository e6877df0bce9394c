//! Engagement ranking and like management.
//!
//! Ranking is a pure function: descending like count, ties broken by
//! input position, truncated to a limit. Nothing here mutates the
//! entities being ranked.

use std::cmp::Reverse;
use std::sync::Arc;
use tracing::debug;

use crate::directory::{AccountDirectory, Directory, FilmCatalog};
use crate::types::{AccountId, Film, FilmId};

/// Default number of entries returned by "popular" queries.
pub const DEFAULT_POPULAR_COUNT: usize = 10;

/// Anything that can be ranked by engagement.
pub trait Rankable {
    /// Identifier type returned by [`rank`].
    type Id: Clone;

    /// Identifier of the entity.
    fn rank_id(&self) -> Self::Id;

    /// Number of distinct likes.
    fn like_count(&self) -> usize;
}

impl Rankable for Film {
    type Id = FilmId;

    fn rank_id(&self) -> FilmId {
        self.id
    }

    fn like_count(&self) -> usize {
        self.likes.len()
    }
}

/// Minimal rankable value: an id and a precomputed like count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankableEntity<I> {
    /// Entity identifier.
    pub id: I,
    /// Number of likes.
    pub likes: usize,
}

impl<I: Clone> Rankable for RankableEntity<I> {
    type Id = I;

    fn rank_id(&self) -> I {
        self.id.clone()
    }

    fn like_count(&self) -> usize {
        self.likes
    }
}

/// Rank entities by descending like count and keep the first `limit`.
///
/// Equal counts keep their input order. `limit == 0` yields an empty
/// ranking; a limit above the input size yields the full ranking.
pub fn rank_entities<E: Rankable>(entities: &[E], limit: usize) -> Vec<&E> {
    if limit == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<&E> = entities.iter().collect();
    // sort_by_key is stable, which gives the input-order tie break.
    ranked.sort_by_key(|e| Reverse(e.like_count()));
    ranked.truncate(limit);
    ranked
}

/// Identifiers of the top `limit` entities, see [`rank_entities`].
pub fn rank<E: Rankable>(entities: &[E], limit: usize) -> Vec<E::Id> {
    rank_entities(entities, limit)
        .into_iter()
        .map(Rankable::rank_id)
        .collect()
}

/// Error type for like operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngagementError {
    /// Film is absent from the catalog.
    #[error("Film not found: {0}")]
    FilmNotFound(FilmId),
    /// Account is absent from the directory.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),
    /// Catalog failure.
    #[error("Catalog error: {0}")]
    Catalog(String),
    /// Directory failure.
    #[error("Directory error: {0}")]
    Directory(String),
}

impl EngagementError {
    /// Create a catalog error from any error type.
    pub fn from_catalog<E: std::error::Error>(e: E) -> Self {
        Self::Catalog(e.to_string())
    }

    /// Create a directory error from any error type.
    pub fn from_directory<E: std::error::Error>(e: E) -> Self {
        Self::Directory(e.to_string())
    }
}

/// Likes and popularity over a film catalog.
pub struct FilmEngagement<C, D> {
    catalog: Arc<C>,
    accounts: Arc<D>,
}

impl<C, D> Clone for FilmEngagement<C, D> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl<C, D> FilmEngagement<C, D>
where
    C: FilmCatalog + 'static,
    D: AccountDirectory + 'static,
{
    /// Create over a catalog and an account directory.
    pub fn new(catalog: Arc<C>, accounts: Arc<D>) -> Self {
        Self { catalog, accounts }
    }

    async fn ensure_pair(&self, film: &FilmId, account: &AccountId) -> Result<(), EngagementError> {
        let film_exists = <C as Directory<FilmId>>::exists(&self.catalog, film)
            .await
            .map_err(EngagementError::from_catalog)?;
        if !film_exists {
            return Err(EngagementError::FilmNotFound(*film));
        }

        let account_exists = <D as Directory<AccountId>>::exists(&self.accounts, account)
            .await
            .map_err(EngagementError::from_directory)?;
        if !account_exists {
            return Err(EngagementError::AccountNotFound(*account));
        }

        Ok(())
    }

    /// Record that `account` likes `film`. Returns whether the like is new.
    pub async fn add_like(&self, film: FilmId, account: AccountId) -> Result<bool, EngagementError> {
        self.ensure_pair(&film, &account).await?;

        let added = self.catalog
            .add_like(&film, &account)
            .await
            .map_err(EngagementError::from_catalog)?;

        debug!(film = %film, account = %account, added, "Like recorded");
        Ok(added)
    }

    /// Withdraw `account`'s like of `film`. Returns whether a like was removed.
    pub async fn remove_like(&self, film: FilmId, account: AccountId) -> Result<bool, EngagementError> {
        self.ensure_pair(&film, &account).await?;

        let removed = self.catalog
            .remove_like(&film, &account)
            .await
            .map_err(EngagementError::from_catalog)?;

        debug!(film = %film, account = %account, removed, "Like withdrawn");
        Ok(removed)
    }

    /// The `count` most liked films.
    pub async fn popular(&self, count: usize) -> Result<Vec<Film>, EngagementError> {
        let films = self.catalog
            .list_films()
            .await
            .map_err(EngagementError::from_catalog)?;

        Ok(rank_entities(&films, count).into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::types::Account;

    fn entity(id: u32, likes: usize) -> RankableEntity<u32> {
        RankableEntity { id, likes }
    }

    #[test]
    fn test_rank_orders_by_count_then_input_order() {
        let entities = [entity(1, 3), entity(2, 3), entity(3, 5)];
        assert_eq!(rank(&entities, 2), vec![3, 1]);
        assert_eq!(rank(&entities, 3), vec![3, 1, 2]);
    }

    #[test]
    fn test_rank_limit_zero_is_empty() {
        let entities = [entity(1, 3)];
        assert!(rank(&entities, 0).is_empty());
    }

    #[test]
    fn test_rank_limit_above_len_returns_all() {
        let entities = [entity(1, 0), entity(2, 4)];
        assert_eq!(rank(&entities, 100), vec![2, 1]);
    }

    #[test]
    fn test_rank_empty_input() {
        let entities: [RankableEntity<u32>; 0] = [];
        assert!(rank(&entities, 5).is_empty());
    }

    #[test]
    fn test_rank_does_not_disturb_input() {
        let entities = vec![entity(1, 1), entity(2, 9)];
        let before = entities.clone();
        let _ = rank(&entities, 1);
        let _ = rank(&entities, 2);
        assert_eq!(entities, before);
    }

    #[test]
    fn test_rank_films_by_likes() {
        let films = vec![
            Film::new(FilmId::new(1), "Andrei Rublev").with_likes([AccountId::new(1)]),
            Film::new(FilmId::new(2), "Nostalghia")
                .with_likes([AccountId::new(1), AccountId::new(2)]),
        ];
        assert_eq!(rank(&films, 10), vec![FilmId::new(2), FilmId::new(1)]);
    }

    fn engagement() -> FilmEngagement<InMemoryDirectory, InMemoryDirectory> {
        let directory = Arc::new(InMemoryDirectory::new());
        for n in 1..=3 {
            directory.add_account(Account::new(AccountId::new(n), format!("u{n}"), format!("u{n}@example.com")));
            directory.add_film(Film::new(FilmId::new(n), format!("Film {n}")));
        }
        FilmEngagement::new(Arc::clone(&directory), directory)
    }

    #[tokio::test]
    async fn test_add_like_is_idempotent() {
        let engagement = engagement();
        assert_eq!(engagement.add_like(FilmId::new(1), AccountId::new(1)).await, Ok(true));
        assert_eq!(engagement.add_like(FilmId::new(1), AccountId::new(1)).await, Ok(false));

        let top = engagement.popular(1).await.unwrap();
        assert_eq!(top[0].id, FilmId::new(1));
        assert_eq!(top[0].like_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_like_is_noop() {
        let engagement = engagement();
        assert_eq!(engagement.remove_like(FilmId::new(2), AccountId::new(3)).await, Ok(false));
    }

    #[tokio::test]
    async fn test_like_requires_existing_film_and_account() {
        let engagement = engagement();
        assert_eq!(
            engagement.add_like(FilmId::new(9), AccountId::new(1)).await,
            Err(EngagementError::FilmNotFound(FilmId::new(9)))
        );
        assert_eq!(
            engagement.add_like(FilmId::new(1), AccountId::new(9)).await,
            Err(EngagementError::AccountNotFound(AccountId::new(9)))
        );
    }

    #[tokio::test]
    async fn test_popular_ranks_catalog() {
        let engagement = engagement();
        for user in 1..=3 {
            engagement.add_like(FilmId::new(3), AccountId::new(user)).await.unwrap();
        }
        engagement.add_like(FilmId::new(2), AccountId::new(1)).await.unwrap();

        let ids: Vec<_> = engagement.popular(DEFAULT_POPULAR_COUNT).await.unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![FilmId::new(3), FilmId::new(2), FilmId::new(1)]);
        assert!(engagement.popular(0).await.unwrap().is_empty());
    }
}
