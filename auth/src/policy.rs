//! Single-active-account enforcement.

use tokio::sync::Mutex;

use workfun_store::{AccountDirectory, StoreError};
use workfun_types::AccountId;

/// Arbiter for every transition that changes who is active.
///
/// Activating an account is two separate store operations (clear every
/// active flag, then set one), not a transaction. The gate serializes these
/// sequences so no interleaving of two grants, or a grant and a revoke, can
/// leave two accounts active. A crash between the two steps can still leave
/// zero accounts active, which is within the 0-or-1 invariant.
pub struct SessionPolicy {
    gate: Mutex<()>,
}

impl SessionPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self { gate: Mutex::new(()) }
    }

    /// Make `id` the single active account.
    pub async fn grant(
        &self,
        directory: &AccountDirectory,
        id: AccountId,
    ) -> Result<(), StoreError> {
        let _guard = self.gate.lock().await;
        directory.deactivate_all().await?;
        directory.activate(id).await
    }

    /// Leave no account active.
    pub async fn revoke(&self, directory: &AccountDirectory) -> Result<(), StoreError> {
        let _guard = self.gate.lock().await;
        directory.deactivate_all().await
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};

    use workfun_store::AccountStore;
    use workfun_types::NewAccount;

    use super::*;

    fn record(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            secret: "pw".to_string(),
            display_name: "Someone".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            created_at: Utc::now(),
            active: false,
        }
    }

    #[tokio::test]
    async fn grant_switches_the_active_account() {
        let directory = AccountDirectory::new(AccountStore::open_in_memory().unwrap());
        let policy = SessionPolicy::new();

        let first = directory.insert(record("a@x.com")).await.unwrap();
        let second = directory.insert(record("b@x.com")).await.unwrap();

        policy.grant(&directory, first).await.unwrap();
        assert_eq!(directory.find_active().await.unwrap().unwrap().id, first);

        policy.grant(&directory, second).await.unwrap();
        assert_eq!(directory.find_active().await.unwrap().unwrap().id, second);

        policy.revoke(&directory).await.unwrap();
        assert!(directory.find_active().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_grants_leave_exactly_one_active() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.db");

        let directory = Arc::new(AccountDirectory::new(AccountStore::open(&path).unwrap()));
        let policy = Arc::new(SessionPolicy::new());

        let mut ids = Vec::new();
        for i in 0..8 {
            ids.push(
                directory
                    .insert(record(&format!("user{i}@x.com")))
                    .await
                    .unwrap(),
            );
        }

        let mut handles = Vec::new();
        for id in ids {
            let directory = Arc::clone(&directory);
            let policy = Arc::clone(&policy);
            handles.push(tokio::spawn(async move {
                policy.grant(&directory, id).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Count active rows through an independent connection.
        let checker = AccountStore::open(&path).unwrap();
        assert_eq!(checker.active_count().unwrap(), 1);
    }
}
