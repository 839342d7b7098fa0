// libs/slot-cell/src/services/conflict.rs
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Slot, SlotError};

/// Two intervals on the same date collide when:
/// start1 < end2 AND start2 < end1
/// Half-open [start, end): touching endpoints do not collide.
pub fn intervals_overlap(
    start1: NaiveTime,
    end1: NaiveTime,
    start2: NaiveTime,
    end2: NaiveTime,
) -> bool {
    start1 < end2 && start2 < end1
}

pub struct OverlapDetectionService {
    supabase_client: SupabaseClient,
}

impl OverlapDetectionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase_client: SupabaseClient::new(config),
        }
    }

    /// Check whether a candidate interval collides with any existing slot of
    /// the specialist on that date. `exclude_slot_id` skips the slot being
    /// updated so it never conflicts with itself.
    pub async fn has_overlap(
        &self,
        specialist_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_slot_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, SlotError> {
        debug!(
            "Checking overlap for specialist {} on {} from {} to {}",
            specialist_id, date, start_time, end_time
        );

        let mut query_parts = vec![
            format!("specialist_id=eq.{}", specialist_id),
            format!("date=eq.{}", date.format("%Y-%m-%d")),
        ];

        if let Some(exclude_id) = exclude_slot_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!(
            "/rest/v1/slots?{}&order=start_time.asc",
            query_parts.join("&")
        );

        let result: Vec<Value> = self
            .supabase_client
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        let slots: Vec<Slot> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Slot>, _>>()
            .map_err(|e| SlotError::DatabaseError(format!("Failed to parse slots: {}", e)))?;

        let overlapping = slots
            .iter()
            .any(|slot| intervals_overlap(slot.start_time, slot.end_time, start_time, end_time));

        if overlapping {
            warn!(
                "Overlap detected for specialist {} on {} from {} to {}",
                specialist_id, date, start_time, end_time
            );
        }

        Ok(overlapping)
    }
}
