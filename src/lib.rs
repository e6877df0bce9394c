//! # filmgraph-kernel
//!
//! Social graph and engagement core for a film catalog.
//!
//! The kernel answers two questions:
//!
//! > Who is friends with whom? Which films are the most liked?
//!
//! ## Core Contract
//!
//! 1. Friendships go through a request → confirm lifecycle and are symmetric
//!    once confirmed
//! 2. Each unordered pair of accounts has at most one relationship record
//! 3. Popularity is a stable ranking by like count
//!
//! ## Architecture
//!
//! ```text
//! FriendshipGraph ──▶ RelationshipStore (Postgres or Memory)
//!        │
//!        └──────────▶ AccountDirectory ◀── FilmEngagement ──▶ FilmCatalog
//! ```
//!
//! Accounts and films are owned elsewhere; the kernel only looks them up.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod directory;
pub mod graph;
pub mod engagement;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    Account, AccountId, Film, FilmId, LikeSet,
    PairKey, RelationshipEdge, RelationshipStatus,
};
pub use store::{
    InMemoryError, InMemoryRelationshipStore, KeyMismatch, PairMutation, PoolStats, RelationshipStore,
};
#[cfg(feature = "postgres")]
pub use store::{PostgresConfig, PostgresError, PostgresRelationshipStore};
pub use directory::{AccountDirectory, Directory, DirectoryError, FilmCatalog, InMemoryDirectory};
#[cfg(feature = "postgres")]
pub use directory::PostgresDirectory;
pub use graph::{FriendshipError, FriendshipGraph, Removal};
pub use engagement::{
    rank, rank_entities, EngagementError, FilmEngagement, Rankable, RankableEntity,
    DEFAULT_POPULAR_COUNT,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version for persisted relationship and like records.
/// Increment on breaking changes to any table layout.
pub const FILMGRAPH_SCHEMA_VERSION: &str = "1.0.0";
