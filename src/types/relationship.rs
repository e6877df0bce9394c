//! Relationship types for the friendship graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh64::xxh64;

use super::account::AccountId;

/// Status of a relationship record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipStatus {
    /// Requested by `requester`, awaiting confirmation by `target`.
    Pending,
    /// Accepted by both parties.
    Confirmed,
}

impl RelationshipStatus {
    /// Parse status from its storage form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            _ => None,
        }
    }

    /// Storage form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical key for an unordered pair of distinct accounts.
///
/// `PairKey::new(a, b) == PairKey::new(b, a)`. Every relationship is
/// stored under exactly one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    low: AccountId,
    high: AccountId,
}

impl PairKey {
    /// Build the key for two accounts. Returns `None` when they are equal.
    pub fn new(a: AccountId, b: AccountId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Smaller account id.
    pub fn low(&self) -> AccountId {
        self.low
    }

    /// Larger account id.
    pub fn high(&self) -> AccountId {
        self.high
    }

    /// Whether the account is one of the two parties.
    pub fn contains(&self, id: &AccountId) -> bool {
        self.low == *id || self.high == *id
    }

    /// The party that is not `id`, if `id` belongs to the pair.
    pub fn other(&self, id: &AccountId) -> Option<AccountId> {
        if self.low == *id {
            Some(self.high)
        } else if self.high == *id {
            Some(self.low)
        } else {
            None
        }
    }

    /// Stable 64-bit fingerprint of the pair.
    ///
    /// Used as the PostgreSQL advisory lock key for per-pair serialization.
    pub fn fingerprint(&self) -> u64 {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.low.get().to_be_bytes());
        bytes[8..].copy_from_slice(&self.high.get().to_be_bytes());
        xxh64(&bytes, 0)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.low, self.high)
    }
}

/// Relationship record between two accounts.
///
/// The direction (`requester` → `target`) only matters while the record
/// is pending. A confirmed record is symmetric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    /// Account that initiated the request.
    pub requester: AccountId,
    /// Account that received the request.
    pub target: AccountId,
    /// Current status.
    pub status: RelationshipStatus,
    /// Time of creation or of the last status transition.
    pub requested_at: DateTime<Utc>,
}

impl RelationshipEdge {
    /// Create a pending request.
    pub fn pending(requester: AccountId, target: AccountId, requested_at: DateTime<Utc>) -> Self {
        Self {
            requester,
            target,
            status: RelationshipStatus::Pending,
            requested_at,
        }
    }

    /// Confirmed copy of this record, stamped with the transition time.
    pub fn confirmed(&self, at: DateTime<Utc>) -> Self {
        Self {
            status: RelationshipStatus::Confirmed,
            requested_at: at,
            ..self.clone()
        }
    }

    /// Key of the pair this record belongs to.
    ///
    /// `None` for a self-referencing record.
    pub fn key(&self) -> Option<PairKey> {
        PairKey::new(self.requester, self.target)
    }

    /// Whether the record is confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.status == RelationshipStatus::Confirmed
    }

    /// Whether `confirmer` may confirm this record as a request from `requester`.
    pub fn awaits(&self, requester: &AccountId, confirmer: &AccountId) -> bool {
        self.status == RelationshipStatus::Pending
            && self.requester == *requester
            && self.target == *confirmer
    }
}
