use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events the scheduling core reports. The mail worker consuming the queue
/// owns message content and delivery; the core only names what happened and
/// to which record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    /// `subject_id` is the new slot's id.
    SlotCreated,
    /// `subject_id` is the freshly registered user's id.
    RegistrationPending,
    /// `subject_id` is the consultation's id.
    ConsultationAccepted,
    /// `subject_id` is the consultation's id.
    ConsultationRejected,
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationEvent::SlotCreated => "slot_created",
            NotificationEvent::RegistrationPending => "registration_pending",
            NotificationEvent::ConsultationAccepted => "consultation_accepted",
            NotificationEvent::ConsultationRejected => "consultation_rejected",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    pub job_id: Uuid,
    pub event: NotificationEvent,
    pub subject_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl NotificationJob {
    pub fn new(event: NotificationEvent, subject_id: Uuid) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            event,
            subject_id,
            created_at: Utc::now(),
        }
    }
}
