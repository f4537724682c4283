//! Async query/mutation surface over the account store.
//!
//! The directory is the only way the rest of the application touches
//! persisted accounts. Each operation moves the blocking SQLite work onto
//! the tokio blocking pool, so calling tasks suspend without stalling the
//! runtime; the store's mutex serializes physical access (single writer).
//!
//! Mutations additionally republish "the current active account, or none"
//! to a watch channel. [`AccountDirectory::subscribe`] hands out receivers
//! that observe the current value immediately and every change afterwards.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use workfun_types::{Account, AccountId, NewAccount};

use crate::account_store::AccountStore;
use crate::error::StoreError;

/// Typed operations over the account store, plus the live active-account feed.
pub struct AccountDirectory {
    store: Arc<Mutex<AccountStore>>,
    active_tx: watch::Sender<Option<Account>>,
}

impl AccountDirectory {
    /// Wrap a store, seeding the feed with the currently active account.
    #[must_use]
    pub fn new(store: AccountStore) -> Self {
        let initial = match store.find_active() {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!("failed to read active account at startup: {e}");
                None
            }
        };
        let (active_tx, _) = watch::channel(initial);
        Self {
            store: Arc::new(Mutex::new(store)),
            active_tx,
        }
    }

    /// Live feed of the active account. The returned receiver yields the
    /// current value on its first await and again on every change until it
    /// is dropped; dropping it stops delivery without touching store state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Account>> {
        let mut rx = self.active_tx.subscribe();
        rx.mark_changed();
        rx
    }

    /// Exact-match credential lookup. No active-flag involvement.
    pub async fn authenticate(
        &self,
        email: &str,
        secret: &str,
    ) -> Result<Option<Account>, StoreError> {
        let (email, secret) = (email.to_owned(), secret.to_owned());
        self.read(move |store| store.authenticate(&email, &secret))
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let email = email.to_owned();
        self.read(move |store| store.find_by_email(&email)).await
    }

    pub async fn find_active(&self) -> Result<Option<Account>, StoreError> {
        self.read(AccountStore::find_active).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let email = email.to_owned();
        self.read(move |store| store.email_exists(&email)).await
    }

    /// Insert a new account, failing with [`StoreError::DuplicateEmail`] on
    /// an email collision.
    pub async fn insert(&self, record: NewAccount) -> Result<AccountId, StoreError> {
        self.write(move |store| store.insert(&record)).await
    }

    pub async fn update(&self, account: Account) -> Result<(), StoreError> {
        self.write(move |store| store.update(&account)).await
    }

    /// Administrative escape hatch; not reachable from any core flow.
    pub async fn delete(&self, id: AccountId) -> Result<(), StoreError> {
        self.write(move |store| store.delete(id)).await
    }

    /// Clear the active flag on every account.
    pub async fn deactivate_all(&self) -> Result<(), StoreError> {
        self.write(AccountStore::deactivate_all).await
    }

    /// Set the active flag on exactly the given account. The session policy
    /// guarantees no other account is concurrently left active.
    pub async fn activate(&self, id: AccountId) -> Result<(), StoreError> {
        self.write(move |store| store.activate(id)).await
    }

    /// Run a pure read on the blocking pool.
    async fn read<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&AccountStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let store = store
                .lock()
                .map_err(|_| StoreError::Task("account store mutex poisoned".to_string()))?;
            op(&store)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Run a mutation on the blocking pool, then republish the active
    /// account as read in the same locked section.
    async fn write<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&AccountStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let (value, active) = tokio::task::spawn_blocking(move || {
            let store = store
                .lock()
                .map_err(|_| StoreError::Task("account store mutex poisoned".to_string()))?;
            let value = op(&store)?;
            let active = store.find_active()?;
            Ok::<_, StoreError>((value, active))
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

        self.active_tx.send_if_modified(|current| {
            if *current == active {
                false
            } else {
                *current = active;
                true
            }
        });
        Ok(value)
    }
}
