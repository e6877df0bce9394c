//! PostgreSQL relationship store for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)
//!
//! ## Concurrency
//!
//! Each update runs in its own transaction holding
//! `pg_advisory_xact_lock(pair fingerprint)`, so decisions for one pair
//! are serialized across every service instance sharing the database.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, Row};
use std::collections::BTreeSet;
use std::time::Duration;

use super::{KeyMismatch, PairMutation, PoolStats, RelationshipStore};
use crate::types::{AccountId, PairKey, RelationshipEdge, RelationshipStatus};

/// DDL for the friendship table.
///
/// One row per unordered pair; `account_low < account_high` is the
/// canonical key and `requester_id`/`target_id` keep the direction.
pub const FRIENDSHIP_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS friendships (
    account_low   BIGINT      NOT NULL,
    account_high  BIGINT      NOT NULL,
    requester_id  BIGINT      NOT NULL,
    target_id     BIGINT      NOT NULL,
    status        TEXT        NOT NULL CHECK (status IN ('PENDING', 'CONFIRMED')),
    requested_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (account_low, account_high),
    CHECK (account_low < account_high),
    CHECK (
        (requester_id = account_low AND target_id = account_high)
        OR (requester_id = account_high AND target_id = account_low)
    )
);
CREATE INDEX IF NOT EXISTS friendships_high_idx ON friendships (account_high);
CREATE INDEX IF NOT EXISTS friendships_target_pending_idx
    ON friendships (target_id) WHERE status = 'PENDING';
"#;

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/filmorate".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }

    /// Open a pool with these settings.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        tracing::info!(
            max_connections = self.max_connections,
            min_connections = self.min_connections,
            connect_timeout_secs = self.connect_timeout_secs,
            idle_timeout_secs = self.idle_timeout_secs,
            max_lifetime_secs = self.max_lifetime_secs,
            "Initializing PostgreSQL connection pool"
        );

        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&self.database_url)
            .await
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A row carried a status outside the closed set.
    #[error("Invalid relationship status in storage: {0}")]
    InvalidStatus(String),
    /// A decided record does not belong to the pair being updated.
    #[error(transparent)]
    KeyMismatch(#[from] KeyMismatch),
}

/// PostgreSQL relationship store.
#[derive(Debug, Clone)]
pub struct PostgresRelationshipStore {
    pool: PgPool,
}

impl PostgresRelationshipStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, sqlx::Error> {
        Ok(Self::new(PostgresConfig::from_env().connect().await?))
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the friendship table if missing.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        (&self.pool).execute(FRIENDSHIP_TABLE_SCHEMA).await?;
        Ok(())
    }

    /// Parse a relationship from a database row.
    fn parse_edge_row(row: &sqlx::postgres::PgRow) -> Result<RelationshipEdge, PostgresError> {
        let requester: i64 = row.try_get("requester_id")?;
        let target: i64 = row.try_get("target_id")?;
        let status_str: String = row.try_get("status")?;
        let requested_at: chrono::DateTime<chrono::Utc> = row.try_get("requested_at")?;

        let status = RelationshipStatus::from_str(&status_str)
            .ok_or(PostgresError::InvalidStatus(status_str))?;

        Ok(RelationshipEdge {
            requester: AccountId::new(requester),
            target: AccountId::new(target),
            status,
            requested_at,
        })
    }
}

#[async_trait]
impl RelationshipStore for PostgresRelationshipStore {
    type Error = PostgresError;

    async fn get_relationship(&self, key: &PairKey) -> Result<Option<RelationshipEdge>, Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT requester_id, target_id, status, requested_at
            FROM friendships
            WHERE account_low = $1 AND account_high = $2
            "#
        )
        .bind(key.low().get())
        .bind(key.high().get())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::parse_edge_row).transpose()
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
        let mut tx = self.pool.begin().await?;

        // Bit-cast: advisory locks take a signed bigint.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key.fingerprint() as i64)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(
            r#"
            SELECT requester_id, target_id, status, requested_at
            FROM friendships
            WHERE account_low = $1 AND account_high = $2
            "#
        )
        .bind(key.low().get())
        .bind(key.high().get())
        .fetch_optional(&mut *tx)
        .await?;

        let current = row.as_ref().map(Self::parse_edge_row).transpose()?;

        let mutation = match decide(current.as_ref()) {
            Ok(mutation) => mutation,
            Err(e) => {
                tx.rollback().await?;
                return Ok(Err(e));
            }
        };

        if let Err(mismatch) = mutation.check_key(key) {
            tx.rollback().await?;
            return Err(mismatch.into());
        }

        match &mutation {
            PairMutation::Unchanged => {}
            PairMutation::Upsert(edge) => {
                sqlx::query(
                    r#"
                    INSERT INTO friendships
                        (account_low, account_high, requester_id, target_id, status, requested_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (account_low, account_high) DO UPDATE
                    SET requester_id = EXCLUDED.requester_id,
                        target_id = EXCLUDED.target_id,
                        status = EXCLUDED.status,
                        requested_at = EXCLUDED.requested_at
                    "#
                )
                .bind(key.low().get())
                .bind(key.high().get())
                .bind(edge.requester.get())
                .bind(edge.target.get())
                .bind(edge.status.as_str())
                .bind(edge.requested_at)
                .execute(&mut *tx)
                .await?;
            }
            PairMutation::Delete => {
                sqlx::query("DELETE FROM friendships WHERE account_low = $1 AND account_high = $2")
                    .bind(key.low().get())
                    .bind(key.high().get())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        tracing::trace!(pair = %key, ?mutation, "Relationship update committed");

        Ok(Ok(mutation))
    }

    async fn confirmed_partners(&self, id: &AccountId) -> Result<BTreeSet<AccountId>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT CASE WHEN account_low = $1 THEN account_high ELSE account_low END AS partner
            FROM friendships
            WHERE (account_low = $1 OR account_high = $1) AND status = 'CONFIRMED'
            "#
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<AccountId, PostgresError> {
                Ok(AccountId::new(row.try_get("partner")?))
            })
            .collect()
    }

    async fn pending_requests_to(&self, id: &AccountId) -> Result<Vec<RelationshipEdge>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT requester_id, target_id, status, requested_at
            FROM friendships
            WHERE target_id = $1 AND status = 'PENDING'
            ORDER BY requester_id
            "#
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_edge_row).collect()
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        })
    }
}
