//! Account persistence for WorkFun.
//!
//! This crate owns the on-disk representation of accounts and the narrow
//! typed surface the rest of the application queries it through:
//!
//! - [`AccountStore`]: synchronous SQLite-backed CRUD over the `accounts`
//!   table. One connection, WAL journal, owner-only file permissions.
//! - [`AccountDirectory`]: the async query/mutation surface. Every call runs
//!   the blocking store work on the tokio blocking pool so logical tasks
//!   suspend instead of stalling the runtime, and every mutation republishes
//!   the active account to a watch-channel feed.
//!
//! All mutation goes through the directory's operation set; nothing edits
//! records directly. Storage faults propagate as [`StoreError`] and are
//! converted into user-facing results one layer up, by the auth service.

mod account_store;
mod directory;
mod error;
mod sqlite_util;

pub use account_store::AccountStore;
pub use directory::AccountDirectory;
pub use error::StoreError;
