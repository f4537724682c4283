//! SQLite-backed durable storage for account records.
//!
//! One `accounts` table keyed by rowid, UNIQUE constraint on email, schema
//! version stamped in `PRAGMA user_version`. Dates and timestamps are stored
//! as ISO 8601 TEXT. This module is purely synchronous CRUD; the async
//! surface and the active-account feed live in [`crate::directory`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use workfun_types::{Account, AccountId, NewAccount};

use crate::error::StoreError;
use crate::sqlite_util::prepare_db_path;

/// Raw column tuple read from an `accounts` row, decoded in a second step
/// so decode failures can name the offending row and column.
type RawAccountRow = (i64, String, String, String, String, String, i64);

const ACCOUNT_COLUMNS: &str =
    "id, email, secret, display_name, date_of_birth, created_at, is_active";

/// Durable keyed store for account records.
#[derive(Debug)]
pub struct AccountStore {
    db: Connection,
}

impl AccountStore {
    /// Schema version written to `PRAGMA user_version` on first open.
    pub const SCHEMA_VERSION: i64 = 1;

    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            secret TEXT NOT NULL,
            display_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            created_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_accounts_active
        ON accounts(is_active);
    ";

    /// Open or create the accounts database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        prepare_db_path(path)?;

        let db = Connection::open(path)?;
        Self::initialize(db)
    }

    /// Open an in-memory accounts database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Connection::open_in_memory()?;
        Self::initialize(db)
    }

    fn initialize(db: Connection) -> Result<Self, StoreError> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;",
        )?;

        let version: i64 = db.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version > Self::SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema(version));
        }

        db.execute_batch(Self::SCHEMA)?;
        if version < Self::SCHEMA_VERSION {
            db.execute_batch(&format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION))?;
        }
        Ok(Self { db })
    }

    /// Insert a new account record, returning the store-assigned id.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] when the UNIQUE(email)
    /// constraint rejects the row.
    pub fn insert(&self, record: &NewAccount) -> Result<AccountId, StoreError> {
        self.db
            .execute(
                "INSERT INTO accounts
                    (email, secret, display_name, date_of_birth, created_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &record.email,
                    &record.secret,
                    &record.display_name,
                    record.date_of_birth.to_string(),
                    record
                        .created_at
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                    i64::from(record.active),
                ],
            )
            .map_err(map_unique_violation)?;

        Ok(AccountId::new(self.db.last_insert_rowid()))
    }

    /// Read an account by id.
    pub fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let raw = self
            .db
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                [id.value()],
                read_raw_row,
            )
            .optional()?;
        raw.map(decode_row).transpose()
    }

    /// Full-record update by id. The id itself is immutable.
    pub fn update(&self, account: &Account) -> Result<(), StoreError> {
        self.db
            .execute(
                "UPDATE accounts
                 SET email = ?1, secret = ?2, display_name = ?3,
                     date_of_birth = ?4, created_at = ?5, is_active = ?6
                 WHERE id = ?7",
                params![
                    &account.email,
                    &account.secret,
                    &account.display_name,
                    account.date_of_birth.to_string(),
                    account
                        .created_at
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                    i64::from(account.active),
                    account.id.value(),
                ],
            )
            .map_err(map_unique_violation)?;
        Ok(())
    }

    /// Delete an account by id. Administrative escape hatch; no core flow
    /// reaches this.
    pub fn delete(&self, id: AccountId) -> Result<(), StoreError> {
        self.db
            .execute("DELETE FROM accounts WHERE id = ?1", [id.value()])?;
        Ok(())
    }

    /// Return the account whose email and secret both match exactly, if any.
    /// Does not check or alter the active flag.
    pub fn authenticate(&self, email: &str, secret: &str) -> Result<Option<Account>, StoreError> {
        let raw = self
            .db
            .query_row(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts
                     WHERE email = ?1 AND secret = ?2 LIMIT 1"
                ),
                params![email, secret],
                read_raw_row,
            )
            .optional()?;
        raw.map(decode_row).transpose()
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let raw = self
            .db
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1 LIMIT 1"),
                [email],
                read_raw_row,
            )
            .optional()?;
        raw.map(decode_row).transpose()
    }

    /// Return the unique active account, or none. The session policy keeps
    /// more-than-one unreachable.
    pub fn find_active(&self) -> Result<Option<Account>, StoreError> {
        let raw = self
            .db
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE is_active = 1 LIMIT 1"),
                [],
                read_raw_row,
            )
            .optional()?;
        raw.map(decode_row).transpose()
    }

    pub fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let count: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM accounts WHERE email = ?1",
            [email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Clear the active flag on every account.
    pub fn deactivate_all(&self) -> Result<(), StoreError> {
        self.db
            .execute("UPDATE accounts SET is_active = 0", [])?;
        Ok(())
    }

    /// Set the active flag on exactly the given account. The caller must
    /// guarantee no other account is concurrently left active.
    pub fn activate(&self, id: AccountId) -> Result<(), StoreError> {
        let rows = self.db.execute(
            "UPDATE accounts SET is_active = 1 WHERE id = ?1",
            [id.value()],
        )?;
        if rows == 0 {
            tracing::warn!("activate touched no rows, account {id} does not exist");
        }
        Ok(())
    }

    /// Number of accounts currently flagged active. 0 or 1 in any reachable
    /// state.
    pub fn active_count(&self) -> Result<usize, StoreError> {
        let count: i64 =
            self.db
                .query_row("SELECT COUNT(*) FROM accounts WHERE is_active = 1", [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// All accounts in id order.
    pub fn all(&self) -> Result<Vec<Account>, StoreError> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id ASC"))?;
        let rows = stmt.query_map([], read_raw_row)?;

        let mut accounts = Vec::new();
        for raw in rows {
            accounts.push(decode_row(raw?)?);
        }
        Ok(accounts)
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawAccountRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_row(raw: RawAccountRow) -> Result<Account, StoreError> {
    let (id, email, secret, display_name, date_of_birth, created_at, is_active) = raw;

    let date_of_birth = date_of_birth
        .parse::<NaiveDate>()
        .map_err(|_| StoreError::Malformed {
            id,
            column: "date_of_birth",
        })?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|_| StoreError::Malformed {
            id,
            column: "created_at",
        })?
        .with_timezone(&Utc);

    Ok(Account {
        id: AccountId::new(id),
        email,
        secret,
        display_name,
        date_of_birth,
        created_at,
        active: is_active != 0,
    })
}

/// Translate a UNIQUE-constraint rejection into the typed duplicate error;
/// everything else stays a raw SQLite fault.
fn map_unique_violation(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, _) = &err
        && code.code == rusqlite::ErrorCode::ConstraintViolation
    {
        return StoreError::DuplicateEmail;
    }
    StoreError::Sqlite(err)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(email: &str, secret: &str, name: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            secret: secret.to_string(),
            display_name: name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            active: false,
        }
    }

    #[test]
    fn insert_then_get_roundtrip() {
        let store = AccountStore::open_in_memory().expect("open store");

        let id = store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");
        let account = store.get(id).expect("get").expect("account exists");

        assert_eq!(account.id, id);
        assert_eq!(account.email, "a@x.com");
        assert_eq!(account.secret, "pw1");
        assert_eq!(account.display_name, "Ann");
        assert_eq!(
            account.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
        );
        assert_eq!(
            account.created_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
        assert!(!account.active);
    }

    #[test]
    fn ids_are_assigned_monotonically() {
        let store = AccountStore::open_in_memory().expect("open store");

        let first = store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");
        let second = store.insert(&record("b@x.com", "pw2", "Bea")).expect("insert");

        assert!(second.value() > first.value());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = AccountStore::open_in_memory().expect("open store");

        store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");
        let err = store
            .insert(&record("a@x.com", "other", "Impostor"))
            .expect_err("duplicate must fail");

        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn authenticate_requires_exact_match() {
        let store = AccountStore::open_in_memory().expect("open store");
        store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");

        assert!(store.authenticate("a@x.com", "pw1").unwrap().is_some());
        assert!(store.authenticate("a@x.com", "wrong").unwrap().is_none());
        assert!(store.authenticate("A@X.COM", "pw1").unwrap().is_none());
        assert!(store.authenticate("unknown@x.com", "pw1").unwrap().is_none());
    }

    #[test]
    fn activate_and_deactivate_all() {
        let store = AccountStore::open_in_memory().expect("open store");
        let first = store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");
        let second = store.insert(&record("b@x.com", "pw2", "Bea")).expect("insert");

        assert!(store.find_active().unwrap().is_none());

        store.activate(first).expect("activate");
        assert_eq!(store.find_active().unwrap().unwrap().id, first);
        assert_eq!(store.active_count().unwrap(), 1);

        store.deactivate_all().expect("deactivate");
        store.activate(second).expect("activate");
        assert_eq!(store.find_active().unwrap().unwrap().id, second);
        assert_eq!(store.active_count().unwrap(), 1);

        store.deactivate_all().expect("deactivate");
        assert!(store.find_active().unwrap().is_none());
        assert_eq!(store.active_count().unwrap(), 0);
    }

    #[test]
    fn activate_missing_account_is_not_an_error() {
        let store = AccountStore::open_in_memory().expect("open store");
        store.activate(AccountId::new(99)).expect("no-op activate");
        assert_eq!(store.active_count().unwrap(), 0);
    }

    #[test]
    fn email_exists_reflects_inserts() {
        let store = AccountStore::open_in_memory().expect("open store");
        assert!(!store.email_exists("a@x.com").unwrap());

        store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");
        assert!(store.email_exists("a@x.com").unwrap());
        assert!(!store.email_exists("A@x.com").unwrap());
    }

    #[test]
    fn update_rewrites_record() {
        let store = AccountStore::open_in_memory().expect("open store");
        let id = store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");

        let mut account = store.get(id).unwrap().unwrap();
        account.display_name = "Annabel".to_string();
        account.active = true;
        store.update(&account).expect("update");

        let reread = store.get(id).unwrap().unwrap();
        assert_eq!(reread.display_name, "Annabel");
        assert!(reread.active);
    }

    #[test]
    fn delete_removes_record() {
        let store = AccountStore::open_in_memory().expect("open store");
        let id = store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");

        store.delete(id).expect("delete");
        assert!(store.get(id).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn all_returns_accounts_in_id_order() {
        let store = AccountStore::open_in_memory().expect("open store");
        store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");
        store.insert(&record("b@x.com", "pw2", "Bea")).expect("insert");

        let accounts = store.all().expect("all");
        assert_eq!(accounts.len(), 2);
        assert!(accounts[0].id.value() < accounts[1].id.value());
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("accounts.db");

        {
            let db = Connection::open(&path).expect("raw open");
            db.execute_batch("PRAGMA user_version = 99").expect("stamp");
        }

        let err = AccountStore::open(&path).expect_err("newer schema must be rejected");
        assert!(matches!(err, StoreError::UnsupportedSchema(99)));
    }

    #[test]
    fn reopen_preserves_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("accounts.db");

        {
            let store = AccountStore::open(&path).expect("open");
            store.insert(&record("a@x.com", "pw1", "Ann")).expect("insert");
        }

        let store = AccountStore::open(&path).expect("reopen");
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.find_by_email("a@x.com").unwrap().is_some());
    }
}
