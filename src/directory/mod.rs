//! Directory backends: account and film lookups owned by the catalog.
//!
//! The kernel never creates or edits these records. It only asks whether
//! an identifier exists, fetches the record for rendering, and (for films)
//! toggles like marks.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::types::{Account, AccountId, Film, FilmId};

/// Key-value lookup of externally owned records.
#[async_trait]
pub trait Directory<K: Send + Sync>: Send + Sync {
    /// Record type returned for a key.
    type Record: Send;
    /// Error type for lookups.
    type Error: std::error::Error + Send + Sync;

    /// Fetch the record for `id`, or `None` if it does not exist.
    async fn get(&self, id: &K) -> Result<Option<Self::Record>, Self::Error>;

    /// Whether `id` exists.
    async fn exists(&self, id: &K) -> Result<bool, Self::Error> {
        Ok(self.get(id).await?.is_some())
    }
}

/// Directory of accounts.
pub trait AccountDirectory: Directory<AccountId, Record = Account> {}

impl<T> AccountDirectory for T where T: Directory<AccountId, Record = Account> + ?Sized {}

/// Film catalog with like-sets.
///
/// Like mutations are set operations: they report whether membership
/// changed and never fail because a like was already (or not) present.
#[async_trait]
pub trait FilmCatalog: Directory<FilmId, Record = Film> {
    /// All films with their like-sets, in catalog order.
    async fn list_films(&self) -> Result<Vec<Film>, <Self as Directory<FilmId>>::Error>;

    /// Add `account` to the film's like-set.
    async fn add_like(
        &self,
        film: &FilmId,
        account: &AccountId,
    ) -> Result<bool, <Self as Directory<FilmId>>::Error>;

    /// Remove `account` from the film's like-set.
    async fn remove_like(
        &self,
        film: &FilmId,
        account: &AccountId,
    ) -> Result<bool, <Self as Directory<FilmId>>::Error>;
}

pub use memory::{DirectoryError, InMemoryDirectory};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresDirectory, FILM_LIKES_TABLE_SCHEMA};
