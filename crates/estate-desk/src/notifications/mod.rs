//! Polled notification feed for the admin back-office.

pub mod domain;
pub mod poller;
pub mod store;

pub use domain::{Notification, NotificationDigest, NotificationFeed, NotificationKind};
pub use poller::{NotificationPoller, NotificationSource, NotificationSubscription};
pub use store::NotificationStore;
