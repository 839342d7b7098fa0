// libs/consultation-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use slot_cell::SlotError;

// ==============================================================================
// CORE CONSULTATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub client_id: Uuid,
    pub status: ConsultationStatus,
    pub is_canceled: bool,
    pub cancel_reason: Option<CancelReason>,
    pub cancel_comment: Option<String>,
    pub is_completed: bool,
}

/// Status workflow: Pending -> {Accepted, Rejected}, both terminal.
/// Cancellation is an orthogonal flag, not a status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConsultationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ConsultationStatus {
    /// Human-readable label for listing projections.
    pub fn display_name(&self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "Awaiting decision",
            ConsultationStatus::Accepted => "Accepted",
            ConsultationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationStatus::Pending => write!(f, "Pending"),
            ConsultationStatus::Accepted => write!(f, "Accepted"),
            ConsultationStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CancelReason {
    Health,
    Personal,
    FoundAnotherSpecialist,
    Other,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConsultationRequest {
    pub slot_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideConsultationRequest {
    pub status: ConsultationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelConsultationRequest {
    pub reason: Option<CancelReason>,
    pub comment: Option<String>,
}

/// What a specialist sees: who asked, on which of their slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistConsultationView {
    pub id: Uuid,
    pub client_username: String,
    pub slot_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ConsultationStatus,
    pub status_display: String,
    pub is_canceled: bool,
}

/// What a client sees: their requests, with the specialist behind each slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConsultationView {
    pub id: Uuid,
    pub specialist_username: String,
    pub slot_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ConsultationStatus,
    pub status_display: String,
    pub is_canceled: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ConsultationError {
    #[error("Slot not found")]
    SlotNotFound,

    #[error("This slot already has an accepted consultation")]
    AlreadyAccepted,

    #[error("You have already requested this slot")]
    DuplicateRequest,

    #[error("This slot is already in the past")]
    SlotInPast,

    #[error("Consultation not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Consultation is already canceled")]
    AlreadyCanceled,

    #[error("Provide a cancel reason or a comment")]
    MissingReason,

    #[error("Status must be Accepted or Rejected")]
    InvalidStatus,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<SlotError> for ConsultationError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::SlotNotFound => ConsultationError::SlotNotFound,
            SlotError::DatabaseError(msg) => ConsultationError::DatabaseError(msg),
            other => ConsultationError::DatabaseError(other.to_string()),
        }
    }
}

// Denials keep the policy wording so every cell answers them the same way.
impl From<shared_utils::policy::PolicyError> for ConsultationError {
    fn from(err: shared_utils::policy::PolicyError) -> Self {
        ConsultationError::Forbidden(err.to_string())
    }
}
