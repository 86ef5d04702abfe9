use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{lenient, RecordId};

/// One row of `GET /job-applications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplicationRow {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub position: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: String,
    #[serde(default, alias = "created_at", deserialize_with = "lenient::timestamp")]
    pub applied_at: Option<DateTime<Utc>>,
}

/// Text fields of the public careers form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    #[serde(default)]
    pub cover_letter: Option<String>,
}

/// Resume attached to an application submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ResumeUpload {
    pub fn pdf(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/pdf".to_string(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub message: Option<String>,
}
