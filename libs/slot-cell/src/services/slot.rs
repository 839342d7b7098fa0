// libs/slot-cell/src/services/slot.rs
use std::collections::HashMap;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use notification_cell::{NotificationEvent, NotificationService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreateSlotRequest, OpenSlotView, Slot, SlotError, UpdateSlotRequest};
use crate::services::conflict::OverlapDetectionService;
use crate::services::validation;

#[derive(Debug, Deserialize)]
struct UserRow {
    id: Uuid,
    username: String,
}

pub struct SlotService {
    supabase_client: SupabaseClient,
    conflict_service: OverlapDetectionService,
    notification_service: NotificationService,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase_client: SupabaseClient::new(config),
            conflict_service: OverlapDetectionService::new(config),
            notification_service: NotificationService::new(config),
        }
    }

    /// Create a new bookable slot for the specialist. Runs interval
    /// validation and overlap detection before persisting.
    pub async fn create_slot(
        &self,
        specialist_id: Uuid,
        request: CreateSlotRequest,
        auth_token: &str,
    ) -> Result<Slot, SlotError> {
        debug!(
            "Creating slot for specialist {} on {} from {} to {}",
            specialist_id, request.date, request.start_time, request.end_time
        );

        let now = Utc::now().naive_utc();
        validation::validate_interval(request.date, request.start_time, request.end_time, now)?;

        let has_overlap = self
            .conflict_service
            .has_overlap(
                specialist_id,
                request.date,
                request.start_time,
                request.end_time,
                None,
                auth_token,
            )
            .await?;
        if has_overlap {
            return Err(SlotError::Overlap);
        }

        let slot_data = json!({
            "specialist_id": specialist_id,
            "date": request.date.format("%Y-%m-%d").to_string(),
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "duration_minutes": validation::duration_minutes(request.start_time, request.end_time),
            "context": request.context,
            "is_available": true
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase_client
            .request_with_headers(
                Method::POST,
                "/rest/v1/slots",
                Some(auth_token),
                Some(slot_data),
                Some(headers),
            )
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(SlotError::DatabaseError("Failed to create slot".to_string()));
        }

        let slot: Slot = serde_json::from_value(result[0].clone())
            .map_err(|e| SlotError::DatabaseError(format!("Failed to parse slot: {}", e)))?;

        info!("Created slot {} for specialist {}", slot.id, specialist_id);
        self.notification_service
            .notify(NotificationEvent::SlotCreated, slot.id);

        Ok(slot)
    }

    /// Merge a patch onto an existing slot and re-validate the result.
    ///
    /// The lookup is scoped to the requester, so a foreign slot id reads as
    /// nonexistent rather than forbidden.
    pub async fn update_slot(
        &self,
        slot_id: Uuid,
        requester_id: Uuid,
        request: UpdateSlotRequest,
        auth_token: &str,
    ) -> Result<Slot, SlotError> {
        debug!("Updating slot {} for specialist {}", slot_id, requester_id);

        let path = format!(
            "/rest/v1/slots?id=eq.{}&specialist_id=eq.{}",
            slot_id, requester_id
        );
        let current = self
            .fetch_slots(&path, auth_token)
            .await?
            .into_iter()
            .next()
            .ok_or(SlotError::SlotNotFound)?;

        let target_specialist_id = match request.specialist_username.as_deref() {
            Some(username) => self.resolve_specialist(username, auth_token).await?,
            None => current.specialist_id,
        };

        let date = request.date.unwrap_or(current.date);
        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);

        let now = Utc::now().naive_utc();
        validation::validate_interval(date, start_time, end_time, now)?;

        let has_overlap = self
            .conflict_service
            .has_overlap(
                target_specialist_id,
                date,
                start_time,
                end_time,
                Some(slot_id),
                auth_token,
            )
            .await?;
        if has_overlap {
            return Err(SlotError::Overlap);
        }

        let mut update_data = serde_json::Map::new();
        if let Some(new_date) = request.date {
            update_data.insert(
                "date".to_string(),
                json!(new_date.format("%Y-%m-%d").to_string()),
            );
        }
        if let Some(new_start) = request.start_time {
            update_data.insert(
                "start_time".to_string(),
                json!(new_start.format("%H:%M:%S").to_string()),
            );
        }
        if let Some(new_end) = request.end_time {
            update_data.insert(
                "end_time".to_string(),
                json!(new_end.format("%H:%M:%S").to_string()),
            );
        }
        if request.start_time.is_some() || request.end_time.is_some() {
            update_data.insert(
                "duration_minutes".to_string(),
                json!(validation::duration_minutes(start_time, end_time)),
            );
        }
        if let Some(context) = request.context {
            update_data.insert("context".to_string(), json!(context));
        }
        if request.specialist_username.is_some() {
            update_data.insert("specialist_id".to_string(), json!(target_specialist_id));
        }

        let path = format!("/rest/v1/slots?id=eq.{}", slot_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase_client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(headers),
            )
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(SlotError::DatabaseError("Failed to update slot".to_string()));
        }

        let slot: Slot = serde_json::from_value(result[0].clone())
            .map_err(|e| SlotError::DatabaseError(format!("Failed to parse slot: {}", e)))?;

        info!("Updated slot {}", slot.id);
        Ok(slot)
    }

    /// Ownership-scoped delete; a foreign slot id reads as nonexistent.
    pub async fn delete_slot(
        &self,
        slot_id: Uuid,
        requester_id: Uuid,
        auth_token: &str,
    ) -> Result<(), SlotError> {
        let path = format!(
            "/rest/v1/slots?id=eq.{}&specialist_id=eq.{}",
            slot_id, requester_id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase_client
            .request_with_headers(Method::DELETE, &path, Some(auth_token), None, Some(headers))
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(SlotError::SlotNotFound);
        }

        info!("Deleted slot {}", slot_id);
        Ok(())
    }

    /// All slots belonging to the specialist, taken ones included.
    pub async fn list_own_slots(
        &self,
        specialist_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Slot>, SlotError> {
        let path = format!(
            "/rest/v1/slots?specialist_id=eq.{}&order=date.asc,start_time.asc",
            specialist_id
        );
        self.fetch_slots(&path, auth_token).await
    }

    /// Slots a client may still request: available and not yet started.
    pub async fn list_open_slots(&self, auth_token: &str) -> Result<Vec<OpenSlotView>, SlotError> {
        let now = Utc::now().naive_utc();
        let today = now.date().format("%Y-%m-%d").to_string();
        let time = now.time().format("%H:%M:%S").to_string();

        let path = format!(
            "/rest/v1/slots?is_available=eq.true&or=(date.gt.{},and(date.eq.{},start_time.gte.{}))&order=date.asc,start_time.asc",
            today, today, time
        );
        let slots = self.fetch_slots(&path, auth_token).await?;
        if slots.is_empty() {
            return Ok(vec![]);
        }

        let mut specialist_ids: Vec<String> = slots
            .iter()
            .map(|slot| slot.specialist_id.to_string())
            .collect();
        specialist_ids.sort();
        specialist_ids.dedup();

        let users_path = format!(
            "/rest/v1/users?id=in.({})&select=id,username",
            specialist_ids.join(",")
        );
        let rows: Vec<UserRow> = self
            .supabase_client
            .request(Method::GET, &users_path, Some(auth_token), None)
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        let usernames: HashMap<Uuid, String> =
            rows.into_iter().map(|row| (row.id, row.username)).collect();

        let views = slots
            .into_iter()
            .map(|slot| OpenSlotView {
                id: slot.id,
                specialist_username: usernames
                    .get(&slot.specialist_id)
                    .cloned()
                    .unwrap_or_default(),
                date: slot.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                duration_minutes: slot.duration_minutes,
                context: slot.context,
            })
            .collect();

        Ok(views)
    }

    /// Fetch one slot by id without ownership scoping.
    pub async fn get_slot(
        &self,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Slot>, SlotError> {
        let path = format!("/rest/v1/slots?id=eq.{}", slot_id);
        let slots = self.fetch_slots(&path, auth_token).await?;
        Ok(slots.into_iter().next())
    }

    /// Unconditional availability flip, used by the consultation workflow
    /// when a request is accepted or canceled.
    pub async fn set_availability(
        &self,
        slot_id: Uuid,
        available: bool,
        auth_token: &str,
    ) -> Result<(), SlotError> {
        debug!("Setting slot {} availability to {}", slot_id, available);

        let path = format!("/rest/v1/slots?id=eq.{}", slot_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let _: Vec<Value> = self
            .supabase_client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_available": available })),
                Some(headers),
            )
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn fetch_slots(&self, path: &str, auth_token: &str) -> Result<Vec<Slot>, SlotError> {
        let result: Vec<Value> = self
            .supabase_client
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Slot>, _>>()
            .map_err(|e| SlotError::DatabaseError(format!("Failed to parse slots: {}", e)))
    }

    async fn resolve_specialist(
        &self,
        username: &str,
        auth_token: &str,
    ) -> Result<Uuid, SlotError> {
        let path = format!(
            "/rest/v1/users?username=eq.{}&role=eq.Specialist&select=id,username",
            urlencoding::encode(username)
        );
        let rows: Vec<UserRow> = self
            .supabase_client
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or(SlotError::SpecialistNotFound)
    }
}
