use async_trait::async_trait;
use serde::Serialize;

use crate::api::{ApiError, BackendClient, InquiryStats, JobStats};
use crate::notifications::NotificationDigest;

#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn job_stats(&self) -> Result<JobStats, ApiError>;
    async fn inquiry_stats(&self) -> Result<InquiryStats, ApiError>;
}

#[async_trait]
impl StatsSource for BackendClient {
    async fn job_stats(&self) -> Result<JobStats, ApiError> {
        BackendClient::job_stats(self).await
    }

    async fn inquiry_stats(&self) -> Result<InquiryStats, ApiError> {
        BackendClient::inquiry_stats(self).await
    }
}

/// Everything the admin dashboard cards show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub jobs: JobStats,
    pub inquiries: InquiryStats,
    pub notifications: NotificationDigest,
    pub open_items: u64,
}

impl DashboardStats {
    /// Fetch job and inquiry counters concurrently. The dashboard is only
    /// ready once both have arrived; either failure fails the whole load.
    pub async fn load<S>(source: &S, notifications: NotificationDigest) -> Result<Self, ApiError>
    where
        S: StatsSource + ?Sized,
    {
        let (jobs, inquiries) = tokio::try_join!(source.job_stats(), source.inquiry_stats())?;
        let open_items = jobs
            .pending_applications
            .saturating_add(inquiries.unread_inquiries);

        Ok(Self {
            jobs,
            inquiries,
            notifications,
            open_items,
        })
    }
}
