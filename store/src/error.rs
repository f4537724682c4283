use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the account store and directory.
///
/// The store and directory let these propagate untranslated; the auth
/// service is the boundary that turns them into user-facing results.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The UNIQUE(email) constraint rejected an insert.
    #[error("an account with that email already exists")]
    DuplicateEmail,

    /// A persisted column failed to decode into its domain type.
    #[error("malformed {column} value in account row {id}")]
    Malformed { id: i64, column: &'static str },

    /// The database was created by a newer schema than this build supports.
    #[error("database schema version {0} is not supported by this build")]
    UnsupportedSchema(i64),

    /// Filesystem preparation of the database path failed.
    #[error("failed to prepare database path {path}: {source}")]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking store task could not run to completion.
    #[error("store task failed: {0}")]
    Task(String),
}
