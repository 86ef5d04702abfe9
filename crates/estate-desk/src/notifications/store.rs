use tokio::sync::watch;

use super::domain::Notification;

/// Holds the latest notification list and wakes subscribers only when its
/// content changes.
#[derive(Debug)]
pub struct NotificationStore {
    sender: watch::Sender<Vec<Notification>>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self { sender }
    }

    /// Replace the held list when `incoming` differs from it. Returns whether
    /// a replacement happened.
    pub fn apply(&self, incoming: Vec<Notification>) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == incoming {
                false
            } else {
                *current = incoming;
                true
            }
        })
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.sender.subscribe()
    }
}
