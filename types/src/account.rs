use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned account identifier.
///
/// Assigned once at insertion (monotonic rowid) and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted credential + profile record.
///
/// `email` is unique across all accounts and compared exactly as supplied.
/// `secret` is an opaque string compared by exact match. `active` is the
/// session flag: at most one account has it set at any observable instant,
/// and it is the only field mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub secret: String,
    pub display_name: String,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

/// An account record before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub secret: String,
    pub display_name: String,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl NewAccount {
    /// Attach a store-assigned id, producing the full record.
    #[must_use]
    pub fn with_id(self, id: AccountId) -> Account {
        Account {
            id,
            email: self.email,
            secret: self.secret,
            display_name: self.display_name,
            date_of_birth: self.date_of_birth,
            created_at: self.created_at,
            active: self.active,
        }
    }
}
