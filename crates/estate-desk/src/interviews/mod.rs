//! Interview scheduling: admin-assigned slots and applicant reschedule requests.

pub mod domain;
pub mod resolver;

pub use domain::{
    ApplicantContact, ApplicantId, Appointment, DateSource, EffectiveInterview,
    RescheduleLookup, RescheduleStatus, ScheduleRequest, ScheduleSummary,
};
pub use resolver::{FailureKind, RescheduleResolver, RescheduleSource, ResolverState};
