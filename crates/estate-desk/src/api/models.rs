use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::lenient;

/// Backend record identifier. The backend is inconsistent about sending ids
/// as numbers or strings, so both decode to the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(value) => Self(value),
            Raw::Unsigned(value) => Self(value.to_string()),
            Raw::Signed(value) => Self(value.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Hiring counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobStats {
    #[serde(deserialize_with = "lenient::or_default")]
    pub total_jobs: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub open_jobs: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub total_applications: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub pending_applications: u64,
}

/// Property inquiry counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InquiryStats {
    #[serde(deserialize_with = "lenient::or_default")]
    pub total_inquiries: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub unread_inquiries: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub responded_inquiries: u64,
}

/// Body shared by newsletter, unsubscribe, and password reset calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}
