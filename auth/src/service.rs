//! Login, registration, and logout against the account directory.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::watch;

use workfun_store::{AccountDirectory, StoreError};
use workfun_types::{Account, AuthError, NewAccount};

use crate::policy::SessionPolicy;

/// Orchestrates the auth flows and translates every outcome into the tagged
/// [`AuthError`] taxonomy.
///
/// This is the single boundary between raw storage faults and the UI layer:
/// nothing above it ever sees a [`StoreError`].
pub struct AuthService {
    directory: Arc<AccountDirectory>,
    policy: SessionPolicy,
}

impl AuthService {
    #[must_use]
    pub fn new(directory: Arc<AccountDirectory>) -> Self {
        Self {
            directory,
            policy: SessionPolicy::new(),
        }
    }

    /// Authenticate and activate. Unknown email and wrong secret collapse
    /// into the same [`AuthError::InvalidCredentials`].
    ///
    /// The returned account is the record as authenticated; the store's
    /// active flag is set as a separate step, observable through
    /// [`Self::current_session`].
    pub async fn login(&self, email: &str, secret: &str) -> Result<Account, AuthError> {
        let account = match self.directory.authenticate(email, secret).await {
            Ok(Some(account)) => account,
            Ok(None) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(AuthError::storage("Login failed", e)),
        };

        self.policy
            .grant(&self.directory, account.id)
            .await
            .map_err(|e| AuthError::storage("Login failed", e))?;

        Ok(account)
    }

    /// Create a new, inactive account. The caller logs in separately.
    pub async fn register(
        &self,
        email: &str,
        secret: &str,
        display_name: &str,
        date_of_birth: NaiveDate,
    ) -> Result<Account, AuthError> {
        match self.directory.email_exists(email).await {
            Ok(true) => return Err(AuthError::DuplicateEmail),
            Ok(false) => {}
            Err(e) => return Err(AuthError::storage("Registration failed", e)),
        }

        let record = NewAccount {
            email: email.to_owned(),
            secret: secret.to_owned(),
            display_name: display_name.to_owned(),
            date_of_birth,
            created_at: Utc::now(),
            active: false,
        };

        match self.directory.insert(record.clone()).await {
            Ok(id) => Ok(record.with_id(id)),
            // The exists-check and the insert are separate operations; a
            // racing insert still trips the UNIQUE constraint.
            Err(StoreError::DuplicateEmail) => Err(AuthError::DuplicateEmail),
            Err(e) => Err(AuthError::storage("Registration failed", e)),
        }
    }

    /// Best-effort logout. Failures are logged and collapsed to `false`.
    pub async fn logout(&self) -> bool {
        match self.policy.revoke(&self.directory).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("logout failed: {e}");
                false
            }
        }
    }

    /// Whether some account is currently active. Storage faults read as
    /// "not logged in".
    pub async fn is_logged_in(&self) -> bool {
        match self.directory.find_active().await {
            Ok(active) => active.is_some(),
            Err(e) => {
                tracing::warn!("failed to read active account: {e}");
                false
            }
        }
    }

    /// Live feed of the active account, or none.
    #[must_use]
    pub fn current_session(&self) -> watch::Receiver<Option<Account>> {
        self.directory.subscribe()
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<AccountDirectory> {
        &self.directory
    }
}
