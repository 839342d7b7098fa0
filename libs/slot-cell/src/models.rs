// libs/slot-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub specialist_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub context: Option<String>,
    pub is_available: bool,
}

impl Slot {
    /// Wall-clock moment the slot begins, for past/future comparisons.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub context: Option<String>,
}

/// Partial update: absent fields keep their current values. A
/// `specialist_username` reassigns the slot to another specialist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSlotRequest {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub context: Option<String>,
    pub specialist_username: Option<String>,
}

/// Client-facing projection of a bookable slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSlotView {
    pub id: Uuid,
    pub specialist_username: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub context: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum SlotError {
    #[error("End time must be later than start time")]
    EndBeforeOrEqualStart,

    #[error("Date cannot be earlier than today")]
    DateInPast,

    #[error("Start time cannot be earlier than the current time")]
    TimeInPast,

    #[error("Slot overlaps another slot of this specialist")]
    Overlap,

    #[error("You have no slot with this id")]
    SlotNotFound,

    #[error("Specialist with this username does not exist")]
    SpecialistNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
