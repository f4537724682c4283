//! UI-facing auth state machine.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use workfun_types::{Account, AuthUiState};

use crate::observer::SessionObserver;
use crate::service::AuthService;

/// Holds the transient request state (loading/error/success) and drives the
/// auth service.
///
/// The error and registration-success flags are sticky: they persist after a
/// request returns until [`Self::clear_error`] /
/// [`Self::clear_registration_success`] acknowledges them. `is_logged_in` is
/// seeded once at construction and kept current from the session feed,
/// independent of the request flags.
///
/// Requests are not cancellable mid-flight, and a second request issued
/// while one is pending is last-write-wins on the transient state; callers
/// are expected to hold submission while `is_loading` is set.
pub struct AuthController {
    service: Arc<AuthService>,
    ui_tx: watch::Sender<AuthUiState>,
    account_rx: watch::Receiver<Option<Account>>,
    login_sync: JoinHandle<()>,
    _observer: SessionObserver,
}

impl AuthController {
    /// Build the controller: seed `is_logged_in`, spawn the session
    /// observer, and keep the logged-in flag synced to the account feed.
    pub async fn new(service: Arc<AuthService>) -> Self {
        // One consistent read seeds both the logged-in flag and the account
        // mirror; the observer keeps them current from there.
        let initial = match service.directory().find_active().await {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!("failed to read active account at construction: {e}");
                None
            }
        };
        let seeded = AuthUiState {
            is_logged_in: initial.is_some(),
            ..AuthUiState::default()
        };
        let (ui_tx, _) = watch::channel(seeded);

        let (account_tx, account_rx) = watch::channel(initial);
        let observer = SessionObserver::spawn(Arc::clone(service.directory()), account_tx);

        let login_sync = {
            let mut feed = account_rx.clone();
            feed.mark_changed();
            let ui_tx = ui_tx.clone();
            tokio::spawn(async move {
                loop {
                    if feed.changed().await.is_err() {
                        break;
                    }
                    let logged_in = feed.borrow_and_update().is_some();
                    ui_tx.send_if_modified(|state| {
                        if state.is_logged_in == logged_in {
                            false
                        } else {
                            state.is_logged_in = logged_in;
                            true
                        }
                    });
                }
            })
        };

        Self {
            service,
            ui_tx,
            account_rx,
            login_sync,
            _observer: observer,
        }
    }

    /// Issue a login request and fold the outcome into the transient state.
    pub async fn login(&self, email: &str, secret: &str) {
        self.ui_tx.send_modify(|state| {
            state.is_loading = true;
            state.error_message = None;
        });

        match self.service.login(email, secret).await {
            Ok(_) => self.ui_tx.send_modify(|state| {
                state.is_loading = false;
                state.is_logged_in = true;
                state.error_message = None;
            }),
            Err(e) => self.ui_tx.send_modify(|state| {
                state.is_loading = false;
                state.error_message = Some(e.to_string());
            }),
        }
    }

    /// Issue a registration request; success sets the sticky
    /// `registration_success` flag instead of logging in.
    pub async fn register(
        &self,
        email: &str,
        secret: &str,
        display_name: &str,
        date_of_birth: NaiveDate,
    ) {
        self.ui_tx.send_modify(|state| {
            state.is_loading = true;
            state.error_message = None;
        });

        match self
            .service
            .register(email, secret, display_name, date_of_birth)
            .await
        {
            Ok(_) => self.ui_tx.send_modify(|state| {
                state.is_loading = false;
                state.registration_success = true;
                state.error_message = None;
            }),
            Err(e) => self.ui_tx.send_modify(|state| {
                state.is_loading = false;
                state.error_message = Some(e.to_string());
            }),
        }
    }

    /// Log out and reset the whole transient state to defaults, regardless
    /// of whether the logout itself succeeded.
    pub async fn logout(&self) {
        self.service.logout().await;
        self.ui_tx.send_replace(AuthUiState::default());
    }

    /// Acknowledge the sticky error flag.
    pub fn clear_error(&self) {
        self.ui_tx.send_modify(|state| state.error_message = None);
    }

    /// Acknowledge the sticky registration-success flag.
    pub fn clear_registration_success(&self) {
        self.ui_tx
            .send_modify(|state| state.registration_success = false);
    }

    /// Current transient state, by value.
    #[must_use]
    pub fn snapshot(&self) -> AuthUiState {
        self.ui_tx.borrow().clone()
    }

    /// Live view of the transient state.
    #[must_use]
    pub fn ui_state(&self) -> watch::Receiver<AuthUiState> {
        let mut rx = self.ui_tx.subscribe();
        rx.mark_changed();
        rx
    }

    /// Live view of the current account, or none.
    #[must_use]
    pub fn current_account(&self) -> watch::Receiver<Option<Account>> {
        let mut rx = self.account_rx.clone();
        rx.mark_changed();
        rx
    }
}

impl Drop for AuthController {
    fn drop(&mut self) {
        self.login_sync.abort();
    }
}
