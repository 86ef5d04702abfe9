use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::domain::{Notification, NotificationDigest, NotificationFeed};
use super::store::NotificationStore;
use crate::api::ApiError;
use crate::config::PollingConfig;

/// Anything that can produce the current notification list. The backend client
/// implements this by polling; a push channel can implement it later without
/// touching subscribers.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn fetch_notifications(
        &self,
        feed: NotificationFeed,
    ) -> Result<Vec<Notification>, ApiError>;
}

/// Periodic re-fetch of one notification feed.
pub struct NotificationPoller<S> {
    source: Arc<S>,
    feed: NotificationFeed,
    interval: Duration,
}

impl<S> NotificationPoller<S>
where
    S: NotificationSource + 'static,
{
    pub fn new(source: Arc<S>, feed: NotificationFeed, config: &PollingConfig) -> Self {
        Self {
            source,
            feed,
            interval: config.interval,
        }
    }

    /// Start polling on the current tokio runtime. The first fetch happens
    /// immediately.
    pub fn spawn(self) -> NotificationSubscription {
        let store = NotificationStore::new();
        let updates = store.subscribe();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(poll_loop(
            self.source,
            self.feed,
            self.interval,
            store,
            shutdown_rx,
        ));

        NotificationSubscription {
            feed: self.feed,
            updates,
            shutdown_tx,
            handle: Some(handle),
        }
    }
}

async fn poll_loop<S>(
    source: Arc<S>,
    feed: NotificationFeed,
    interval: Duration,
    store: NotificationStore,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    S: NotificationSource + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            result = source.fetch_notifications(feed) => result,
        };

        // Holding the read guard blocks `cancel` until the write below is done,
        // so nothing lands in the store once `cancel` has returned.
        let cancelled = shutdown_rx.borrow();
        if *cancelled {
            debug!(?feed, "discarding notification fetch completed after cancel");
            break;
        }

        match result {
            Ok(notifications) => {
                let count = notifications.len();
                if store.apply(notifications) {
                    debug!(?feed, count, "notification feed changed");
                }
            }
            Err(err) => {
                warn!(?feed, error = %err, "notification poll failed; keeping previous list");
            }
        }
        drop(cancelled);
    }

    debug!(?feed, "notification poller stopped");
}

/// Handle to a running poller. Dropping it cancels the poll task.
pub struct NotificationSubscription {
    feed: NotificationFeed,
    updates: watch::Receiver<Vec<Notification>>,
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl NotificationSubscription {
    pub fn feed(&self) -> NotificationFeed {
        self.feed
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.updates.borrow().clone()
    }

    pub fn digest(&self) -> NotificationDigest {
        NotificationDigest::from_notifications(&self.updates.borrow())
    }

    /// Wait for the next content change. Returns `None` once the poller has
    /// stopped.
    pub async fn changed(&mut self) -> Option<Vec<Notification>> {
        self.updates.changed().await.ok()?;
        Some(self.updates.borrow_and_update().clone())
    }

    pub fn cancel(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Cancel and wait for the poll task to exit.
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "notification poller task ended abnormally");
            }
        }
    }
}

impl Drop for NotificationSubscription {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}
