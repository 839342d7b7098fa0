// libs/slot-cell/src/services/validation.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::SlotError;

/// Check a proposed (date, start, end) interval for internal validity.
///
/// `now` is passed in rather than read from the clock so callers and tests
/// share one code path.
pub fn validate_interval(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    now: NaiveDateTime,
) -> Result<(), SlotError> {
    if end_time <= start_time {
        return Err(SlotError::EndBeforeOrEqualStart);
    }

    if date < now.date() {
        return Err(SlotError::DateInPast);
    }

    if date == now.date() && start_time <= now.time() {
        return Err(SlotError::TimeInPast);
    }

    Ok(())
}

/// Derived slot length. Callers only invoke this on validated intervals, so
/// the result is always positive.
pub fn duration_minutes(start_time: NaiveTime, end_time: NaiveTime) -> i64 {
    (end_time - start_time).num_minutes()
}
