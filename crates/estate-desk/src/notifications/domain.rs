use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{lenient, RecordId};

/// Backend-originated event shown in the admin notification feed. Fields the
/// backend sends malformed decode to blanks so one bad row never drops the
/// whole feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub message: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::or_default")]
    pub kind: NotificationKind,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    #[default]
    #[serde(other)]
    Unknown,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            NotificationKind::Success => "Success",
            NotificationKind::Error => "Error",
            NotificationKind::Info => "Info",
            NotificationKind::Unknown => "Other",
        }
    }
}

/// Which backend list a subscription follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationFeed {
    #[default]
    All,
    JobApplications,
    PropertyInquiries,
}

impl NotificationFeed {
    pub fn path_segments(self) -> &'static [&'static str] {
        match self {
            NotificationFeed::All => &["notifications"],
            NotificationFeed::JobApplications => &["notifications", "job-applications"],
            NotificationFeed::PropertyInquiries => &["notifications", "property-inquiries"],
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all" => Some(Self::All),
            "job_applications" | "jobs" => Some(Self::JobApplications),
            "property_inquiries" | "inquiries" => Some(Self::PropertyInquiries),
            _ => None,
        }
    }
}

/// Counts for the dashboard badge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationDigest {
    pub total: usize,
    pub unread: usize,
    pub success: usize,
    pub error: usize,
    pub info: usize,
}

impl NotificationDigest {
    pub fn from_notifications(notifications: &[Notification]) -> Self {
        notifications
            .iter()
            .fold(Self::default(), |mut digest, notification| {
                digest.total += 1;
                if !notification.is_read {
                    digest.unread += 1;
                }
                match notification.kind {
                    NotificationKind::Success => digest.success += 1,
                    NotificationKind::Error => digest.error += 1,
                    NotificationKind::Info | NotificationKind::Unknown => digest.info += 1,
                }
                digest
            })
    }
}
