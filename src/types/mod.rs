//! Core types for the film graph kernel.

pub mod account;
pub mod film;
pub mod relationship;

pub use account::{Account, AccountId};
pub use film::{Film, FilmId, LikeSet};
pub use relationship::{PairKey, RelationshipEdge, RelationshipStatus};
