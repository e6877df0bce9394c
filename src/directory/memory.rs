//! In-memory directory for testing.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{Directory, FilmCatalog};
use crate::types::{Account, AccountId, Film, FilmId};

/// Error type for in-memory directory.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// Like mutation on a film the catalog does not hold.
    #[error("Film not found: {0}")]
    FilmNotFound(FilmId),
}

/// In-memory account and film directory.
///
/// Uses BTreeMap for deterministic iteration order, so `list_films`
/// returns films by ascending id.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
    films: RwLock<BTreeMap<FilmId, Film>>,
}

impl InMemoryDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an account.
    pub fn add_account(&self, account: Account) {
        self.accounts.write().insert(account.id, account);
    }

    /// Add or replace a film.
    pub fn add_film(&self, film: Film) {
        self.films.write().insert(film.id, film);
    }

    /// Drop an account.
    pub fn remove_account(&self, id: &AccountId) -> Option<Account> {
        self.accounts.write().remove(id)
    }

    /// Get number of accounts.
    pub fn num_accounts(&self) -> usize {
        self.accounts.read().len()
    }

    /// Get number of films.
    pub fn num_films(&self) -> usize {
        self.films.read().len()
    }
}

#[async_trait]
impl Directory<AccountId> for InMemoryDirectory {
    type Record = Account;
    type Error = DirectoryError;

    async fn get(&self, id: &AccountId) -> Result<Option<Account>, Self::Error> {
        Ok(self.accounts.read().get(id).cloned())
    }

    async fn exists(&self, id: &AccountId) -> Result<bool, Self::Error> {
        Ok(self.accounts.read().contains_key(id))
    }
}

#[async_trait]
impl Directory<FilmId> for InMemoryDirectory {
    type Record = Film;
    type Error = DirectoryError;

    async fn get(&self, id: &FilmId) -> Result<Option<Film>, Self::Error> {
        Ok(self.films.read().get(id).cloned())
    }

    async fn exists(&self, id: &FilmId) -> Result<bool, Self::Error> {
        Ok(self.films.read().contains_key(id))
    }
}

#[async_trait]
impl FilmCatalog for InMemoryDirectory {
    async fn list_films(&self) -> Result<Vec<Film>, DirectoryError> {
        Ok(self.films.read().values().cloned().collect())
    }

    async fn add_like(&self, film: &FilmId, account: &AccountId) -> Result<bool, DirectoryError> {
        self.films
            .write()
            .get_mut(film)
            .map(|f| f.add_like(*account))
            .ok_or(DirectoryError::FilmNotFound(*film))
    }

    async fn remove_like(&self, film: &FilmId, account: &AccountId) -> Result<bool, DirectoryError> {
        self.films
            .write()
            .get_mut(film)
            .map(|f| f.remove_like(account))
            .ok_or(DirectoryError::FilmNotFound(*film))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        directory.add_account(Account::new(AccountId::new(1), "alice", "alice@example.com"));
        directory.add_film(Film::new(FilmId::new(10), "Mirror"));
        directory
    }

    #[tokio::test]
    async fn test_account_lookup() {
        let directory = directory();

        let found: Option<Account> = directory.get(&AccountId::new(1)).await.unwrap();
        assert_eq!(found.map(|a| a.login), Some("alice".to_string()));
        assert!(!Directory::<AccountId>::exists(&directory, &AccountId::new(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_like_toggles_are_idempotent() {
        let directory = directory();
        let film = FilmId::new(10);
        let user = AccountId::new(1);

        assert!(directory.add_like(&film, &user).await.unwrap());
        assert!(!directory.add_like(&film, &user).await.unwrap());

        let stored: Option<Film> = directory.get(&film).await.unwrap();
        assert_eq!(stored.unwrap().like_count(), 1);

        assert!(directory.remove_like(&film, &user).await.unwrap());
        assert!(!directory.remove_like(&film, &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_removed_account_no_longer_exists() {
        let directory = directory();
        let removed = directory.remove_account(&AccountId::new(1));

        assert_eq!(removed.map(|a| a.login), Some("alice".to_string()));
        assert!(directory.remove_account(&AccountId::new(1)).is_none());
        assert!(!Directory::<AccountId>::exists(&directory, &AccountId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_like_on_missing_film_fails() {
        let directory = directory();
        let result = directory.add_like(&FilmId::new(99), &AccountId::new(1)).await;
        assert!(matches!(result, Err(DirectoryError::FilmNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_films_in_id_order() {
        let directory = directory();
        directory.add_film(Film::new(FilmId::new(3), "Ivan's Childhood"));

        assert_eq!(directory.num_films(), 2);

        let ids: Vec<_> = directory.list_films().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![FilmId::new(3), FilmId::new(10)]);
    }
}
