//! Typed access to the backend REST service.

mod client;
pub(crate) mod lenient;
pub mod models;

pub use client::BackendClient;
pub use models::{EmailRequest, InquiryStats, JobStats, RecordId, UserSummary};

use reqwest::StatusCode;

/// Failure of a backend call. Nothing is retried; callers decide what to show.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required input was empty; no request was sent.
    #[error("{0} is required")]
    MissingInput(&'static str),
    /// The backend answered with a non-success status. The body is not read.
    #[error("backend returned {status} for {path}")]
    Status { status: StatusCode, path: String },
    #[error("backend request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("backend response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("unsupported upload content type '{0}'")]
    InvalidContentType(String),
    #[error("backend base URL cannot carry a path")]
    InvalidBaseUrl,
    #[error("http client could not be built: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}
