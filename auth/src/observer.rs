//! Background mirror of the directory's active-account feed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use workfun_store::AccountDirectory;
use workfun_types::Account;

/// A long-lived subscription that mirrors the directory's feed into a
/// locally owned watch channel.
///
/// Purely passive: no transition logic, only forwarding. If the underlying
/// feed is torn down (store reset) the task takes a fresh subscription;
/// it exits when every receiver of the mirror is gone. Dropping the
/// observer aborts the task, which stops delivery without touching store
/// state.
pub struct SessionObserver {
    task: JoinHandle<()>,
}

impl SessionObserver {
    /// Spawn the mirror task, forwarding the directory feed into `mirror`.
    pub fn spawn(
        directory: Arc<AccountDirectory>,
        mirror: watch::Sender<Option<Account>>,
    ) -> Self {
        let task = tokio::spawn(async move {
            loop {
                let mut feed = directory.subscribe();
                loop {
                    let current = feed.borrow_and_update().clone();
                    mirror.send_if_modified(|held| {
                        if *held == current {
                            false
                        } else {
                            *held = current.clone();
                            true
                        }
                    });
                    if mirror.is_closed() {
                        return;
                    }
                    if feed.changed().await.is_err() {
                        // Feed torn down; fall through and re-subscribe.
                        break;
                    }
                }
                tracing::debug!("active-account feed closed, re-subscribing");
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        });
        Self { task }
    }
}

impl Drop for SessionObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
