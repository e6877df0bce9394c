//! Account types for the friendship graph.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an account.
///
/// Wraps the signed 64-bit key used by the catalog tables and implements
/// `Ord` so relationship keys can be canonicalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    /// Create a new AccountId.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw key.
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Account record as held by the directory.
///
/// The friendship graph only cares that an account exists; the remaining
/// fields are carried so friend lists can be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Unique login.
    pub login: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Date of birth, if provided.
    pub birthday: Option<NaiveDate>,
}

impl Account {
    /// Create an account whose display name defaults to its login.
    pub fn new(id: AccountId, login: impl Into<String>, email: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            id,
            name: login.clone(),
            login,
            email: email.into(),
            birthday: None,
        }
    }

    /// Set the display name. Blank names keep the login.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.name = name;
        }
        self
    }

    /// Set the date of birth.
    pub fn with_birthday(mut self, birthday: NaiveDate) -> Self {
        self.birthday = Some(birthday);
        self
    }
}
