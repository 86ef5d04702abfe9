use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::domain::{ApplicantId, RescheduleLookup, ScheduleSummary};
use crate::api::ApiError;

pub const FETCH_FAILED_MESSAGE: &str = "failed to fetch reschedule details";
pub const EMAIL_REQUIRED_MESSAGE: &str = "an email address is required to look up an interview";

/// Backend lookup returning appointment and reschedule records together.
#[async_trait]
pub trait RescheduleSource: Send + Sync {
    async fn reschedule_lookup(
        &self,
        applicant_id: &ApplicantId,
        email: &str,
    ) -> Result<RescheduleLookup, ApiError>;
}

#[async_trait]
impl<T> RescheduleSource for Arc<T>
where
    T: RescheduleSource + ?Sized,
{
    async fn reschedule_lookup(
        &self,
        applicant_id: &ApplicantId,
        email: &str,
    ) -> Result<RescheduleLookup, ApiError> {
        (**self).reschedule_lookup(applicant_id, email).await
    }
}

/// Why a lookup ended without a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Applicant input was incomplete; nothing was sent to the backend.
    MissingInput,
    /// The backend call failed or was refused.
    Fetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    Loading,
    Ready(Box<ScheduleSummary>),
    Failed { kind: FailureKind, message: String },
}

/// Loads the schedule for the current applicant and publishes the outcome to
/// any number of views. The effective interview is recomputed on every load.
pub struct RescheduleResolver<S> {
    source: S,
    state: watch::Sender<ResolverState>,
    generation: AtomicU64,
}

impl<S> RescheduleResolver<S>
where
    S: RescheduleSource,
{
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(ResolverState::Idle);
        Self {
            source,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolverState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ResolverState {
        self.state.borrow().clone()
    }

    pub fn is_idle(&self) -> bool {
        matches!(*self.state.borrow(), ResolverState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), ResolverState::Loading)
    }

    pub fn error(&self) -> Option<String> {
        match &*self.state.borrow() {
            ResolverState::Failed { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match &*self.state.borrow() {
            ResolverState::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<ScheduleSummary> {
        match &*self.state.borrow() {
            ResolverState::Ready(summary) => Some(summary.as_ref().clone()),
            _ => None,
        }
    }

    /// Load the schedule for `applicant_id`. A blank or missing identifier
    /// leaves the resolver idle; a missing email fails locally. Neither reaches
    /// the network. A response for an applicant that has since been replaced
    /// by a newer `load` is dropped.
    pub async fn load(&self, applicant_id: Option<&str>, email: Option<&str>) -> ResolverState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(applicant_id) = applicant_id.and_then(ApplicantId::parse) else {
            self.state.send_replace(ResolverState::Idle);
            return ResolverState::Idle;
        };

        let Some(email) = email.map(str::trim).filter(|email| !email.is_empty()) else {
            let failed = ResolverState::Failed {
                kind: FailureKind::MissingInput,
                message: EMAIL_REQUIRED_MESSAGE.to_string(),
            };
            self.state.send_replace(failed.clone());
            return failed;
        };

        self.state.send_replace(ResolverState::Loading);
        debug!(applicant_id = applicant_id.as_str(), "loading interview schedule");

        let next = match self.source.reschedule_lookup(&applicant_id, email).await {
            Ok(lookup) => {
                ResolverState::Ready(Box::new(ScheduleSummary::from_lookup(applicant_id, lookup)))
            }
            Err(ApiError::MissingInput(field)) => {
                ResolverState::Failed {
                    kind: FailureKind::MissingInput,
                    message: format!("{field} is required"),
                }
            }
            Err(err) => {
                warn!(
                    applicant_id = applicant_id.as_str(),
                    error = %err,
                    "interview schedule lookup failed"
                );
                ResolverState::Failed {
                    kind: FailureKind::Fetch,
                    message: FETCH_FAILED_MESSAGE.to_string(),
                }
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) == generation {
                *state = next.clone();
                true
            } else {
                false
            }
        });
        if !applied {
            debug!("discarding interview schedule for a superseded applicant");
        }

        next
    }

    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(ResolverState::Idle);
    }
}
