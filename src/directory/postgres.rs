//! PostgreSQL directory over the catalog's `users` and `films` tables.
//!
//! `users` and `films` belong to the catalog and are only read here.
//! `film_likes` is owned by the kernel.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::{Executor, Row};

use super::{Directory, FilmCatalog};
use crate::store::PostgresError;
use crate::types::{Account, AccountId, Film, FilmId};

/// DDL for the like table.
pub const FILM_LIKES_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS film_likes (
    film_id  BIGINT NOT NULL,
    user_id  BIGINT NOT NULL,
    PRIMARY KEY (film_id, user_id)
);
"#;

/// PostgreSQL account and film directory.
#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the like table if missing.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        (&self.pool).execute(FILM_LIKES_TABLE_SCHEMA).await?;
        Ok(())
    }

    fn parse_account_row(row: &sqlx::postgres::PgRow) -> Result<Account, sqlx::Error> {
        let mut account = Account::new(
            AccountId::new(row.try_get("id")?),
            row.try_get::<String, _>("login")?,
            row.try_get::<String, _>("email")?,
        );
        // Blank or missing names fall back to the login.
        if let Some(name) = row.try_get::<Option<String>, _>("name")? {
            account = account.with_name(name);
        }
        if let Some(birthday) = row.try_get::<Option<chrono::NaiveDate>, _>("birthday")? {
            account = account.with_birthday(birthday);
        }
        Ok(account)
    }

    fn parse_film_row(row: &sqlx::postgres::PgRow) -> Result<Film, sqlx::Error> {
        let likes: Vec<i64> = row.try_get("likes")?;
        Ok(Film::new(FilmId::new(row.try_get("id")?), row.try_get::<String, _>("name")?)
            .with_likes(likes.into_iter().map(AccountId::new)))
    }
}

#[async_trait]
impl Directory<AccountId> for PostgresDirectory {
    type Record = Account;
    type Error = PostgresError;

    async fn get(&self, id: &AccountId) -> Result<Option<Account>, Self::Error> {
        let row = sqlx::query("SELECT id, login, name, email, birthday FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::parse_account_row).transpose()?)
    }

    async fn exists(&self, id: &AccountId) -> Result<bool, Self::Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl Directory<FilmId> for PostgresDirectory {
    type Record = Film;
    type Error = PostgresError;

    async fn get(&self, id: &FilmId) -> Result<Option<Film>, Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT f.id, f.name,
                   COALESCE(array_agg(l.user_id ORDER BY l.user_id)
                            FILTER (WHERE l.user_id IS NOT NULL), '{}') AS likes
            FROM films f
            LEFT JOIN film_likes l ON l.film_id = f.id
            WHERE f.id = $1
            GROUP BY f.id, f.name
            "#
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::parse_film_row).transpose()?)
    }

    async fn exists(&self, id: &FilmId) -> Result<bool, Self::Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM films WHERE id = $1)")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl FilmCatalog for PostgresDirectory {
    async fn list_films(&self) -> Result<Vec<Film>, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT f.id, f.name,
                   COALESCE(array_agg(l.user_id ORDER BY l.user_id)
                            FILTER (WHERE l.user_id IS NOT NULL), '{}') AS likes
            FROM films f
            LEFT JOIN film_likes l ON l.film_id = f.id
            GROUP BY f.id, f.name
            ORDER BY f.id
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(Self::parse_film_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }

    async fn add_like(&self, film: &FilmId, account: &AccountId) -> Result<bool, PostgresError> {
        let result = sqlx::query(
            "INSERT INTO film_likes (film_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        )
        .bind(film.get())
        .bind(account.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_like(&self, film: &FilmId, account: &AccountId) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM film_likes WHERE film_id = $1 AND user_id = $2")
            .bind(film.get())
            .bind(account.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
