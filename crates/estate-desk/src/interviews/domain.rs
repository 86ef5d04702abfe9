use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{lenient, RecordId};

/// Applicant identifier used in `/reschedule/{applicant_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

impl ApplicantId {
    /// Returns `None` for blank identifiers.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Interview slot assigned by an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub admin_schedule: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub admin_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RescheduleStatus {
    Pending,
    Approved,
    Rejected,
    #[default]
    #[serde(rename = "no request")]
    NoRequest,
    #[serde(other)]
    Unrecognized,
}

impl RescheduleStatus {
    pub fn label(self) -> &'static str {
        match self {
            RescheduleStatus::Pending => "Pending",
            RescheduleStatus::Approved => "Approved",
            RescheduleStatus::Rejected => "Rejected",
            RescheduleStatus::NoRequest => "No request",
            RescheduleStatus::Unrecognized => "Unknown",
        }
    }
}

/// Applicant-initiated proposal to move the interview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub requested_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub applicant_message: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: RescheduleStatus,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub attachment_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantContact {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub position: Option<String>,
}

/// Body of `GET /reschedule/{applicant_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleLookup {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub appointment: Appointment,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub reschedule: ScheduleRequest,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub applicant: ApplicantContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    AdminSchedule,
    ApprovedReschedule,
}

/// The single interview date shown to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveInterview {
    pub date: Option<DateTime<Utc>>,
    pub admin_message: Option<String>,
    pub applicant_message: Option<String>,
    pub status: RescheduleStatus,
    pub source: DateSource,
}

impl EffectiveInterview {
    /// An approved request with a date overrides the admin schedule. Every
    /// other combination shows the admin schedule.
    pub fn resolve(appointment: &Appointment, request: &ScheduleRequest) -> Self {
        let (date, source) = match (request.status, request.requested_date) {
            (RescheduleStatus::Approved, Some(requested)) => {
                (Some(requested), DateSource::ApprovedReschedule)
            }
            _ => (appointment.admin_schedule, DateSource::AdminSchedule),
        };

        let applicant_message = match request.status {
            RescheduleStatus::NoRequest => None,
            _ => request.applicant_message.clone(),
        };

        Self {
            date,
            admin_message: appointment.admin_message.clone(),
            applicant_message,
            status: request.status,
            source,
        }
    }
}

/// Display-ready schedule card for the applicant portal and admin calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub applicant_id: ApplicantId,
    pub applicant: ApplicantContact,
    pub interview: EffectiveInterview,
    pub date_label: String,
    pub status_label: &'static str,
    pub attachment_path: Option<String>,
}

impl ScheduleSummary {
    pub fn from_lookup(applicant_id: ApplicantId, lookup: RescheduleLookup) -> Self {
        let interview = EffectiveInterview::resolve(&lookup.appointment, &lookup.reschedule);
        let date_label = interview
            .date
            .map(|date| date.format("%a, %d %b %Y %H:%M UTC").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let status_label = interview.status.label();

        Self {
            applicant_id,
            applicant: lookup.applicant,
            interview,
            date_label,
            status_label,
            attachment_path: lookup.reschedule.attachment_path,
        }
    }
}
