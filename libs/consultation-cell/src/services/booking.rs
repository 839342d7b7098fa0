// libs/consultation-cell/src/services/booking.rs
use std::collections::HashMap;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use slot_cell::{Slot, SlotService};

use crate::models::{
    ClientConsultationView, Consultation, ConsultationError, SpecialistConsultationView,
};

#[derive(Debug, Deserialize)]
struct UserRow {
    id: Uuid,
    username: String,
}

pub struct ConsultationBookingService {
    supabase_client: SupabaseClient,
    slot_service: SlotService,
}

impl ConsultationBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase_client: SupabaseClient::new(config),
            slot_service: SlotService::new(config),
        }
    }

    /// File a Pending request against a slot. Checks run in a fixed order:
    /// slot existence, competing accepted request, duplicate by this client,
    /// slot already started.
    pub async fn request_consultation(
        &self,
        client_id: Uuid,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        info!("Client {} requesting slot {}", client_id, slot_id);

        let slot = self
            .slot_service
            .get_slot(slot_id, auth_token)
            .await?
            .ok_or(ConsultationError::SlotNotFound)?;

        let accepted_path = format!(
            "/rest/v1/consultations?slot_id=eq.{}&status=eq.Accepted",
            slot_id
        );
        if !self
            .fetch_consultations(&accepted_path, auth_token)
            .await?
            .is_empty()
        {
            return Err(ConsultationError::AlreadyAccepted);
        }

        // Any prior request by this client counts, canceled ones included.
        let mine_path = format!(
            "/rest/v1/consultations?slot_id=eq.{}&client_id=eq.{}",
            slot_id, client_id
        );
        if !self
            .fetch_consultations(&mine_path, auth_token)
            .await?
            .is_empty()
        {
            return Err(ConsultationError::DuplicateRequest);
        }

        if slot.starts_at() <= Utc::now().naive_utc() {
            return Err(ConsultationError::SlotInPast);
        }

        let consultation_data = json!({
            "slot_id": slot_id,
            "client_id": client_id,
            "status": "Pending",
            "is_canceled": false,
            "is_completed": false
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
                "/rest/v1/consultations",
                Some(auth_token),
                Some(consultation_data),
                Some(headers),
            )
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ConsultationError::DatabaseError(
                "Failed to create consultation".to_string(),
            ));
        }

        let consultation: Consultation = serde_json::from_value(result[0].clone())
            .map_err(|e| ConsultationError::DatabaseError(format!("Failed to parse consultation: {}", e)))?;

        info!("Created consultation {} on slot {}", consultation.id, slot_id);
        Ok(consultation)
    }

    /// Requests filed against the specialist's own slots.
    pub async fn list_specialist_consultations(
        &self,
        specialist_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<SpecialistConsultationView>, ConsultationError> {
        let slots = self
            .slot_service
            .list_own_slots(specialist_id, auth_token)
            .await?;
        if slots.is_empty() {
            return Ok(vec![]);
        }

        let slot_ids: Vec<String> = slots.iter().map(|slot| slot.id.to_string()).collect();
        let path = format!(
            "/rest/v1/consultations?slot_id=in.({})",
            slot_ids.join(",")
        );
        let consultations = self.fetch_consultations(&path, auth_token).await?;
        if consultations.is_empty() {
            return Ok(vec![]);
        }

        let client_ids: Vec<Uuid> = consultations.iter().map(|c| c.client_id).collect();
        let usernames = self.fetch_usernames(&client_ids, auth_token).await?;

        let slots_by_id: HashMap<Uuid, &Slot> =
            slots.iter().map(|slot| (slot.id, slot)).collect();

        let mut views: Vec<SpecialistConsultationView> = consultations
            .into_iter()
            .filter_map(|consultation| {
                let slot = slots_by_id.get(&consultation.slot_id)?;
                Some(SpecialistConsultationView {
                    id: consultation.id,
                    client_username: usernames
                        .get(&consultation.client_id)
                        .cloned()
                        .unwrap_or_default(),
                    slot_id: slot.id,
                    date: slot.date,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                    status: consultation.status,
                    status_display: consultation.status.display_name().to_string(),
                    is_canceled: consultation.is_canceled,
                })
            })
            .collect();

        views.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(views)
    }

    /// The client's own requests, joined with slot times and the specialist
    /// behind each slot.
    pub async fn list_client_consultations(
        &self,
        client_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<ClientConsultationView>, ConsultationError> {
        let path = format!("/rest/v1/consultations?client_id=eq.{}", client_id);
        let consultations = self.fetch_consultations(&path, auth_token).await?;
        if consultations.is_empty() {
            return Ok(vec![]);
        }

        let mut slot_ids: Vec<String> = consultations
            .iter()
            .map(|c| c.slot_id.to_string())
            .collect();
        slot_ids.sort();
        slot_ids.dedup();

        let slots_path = format!("/rest/v1/slots?id=in.({})", slot_ids.join(","));
        let result: Vec<Value> = self
            .supabase_client
            .request(Method::GET, &slots_path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;
        let slots: Vec<Slot> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Slot>, _>>()
            .map_err(|e| ConsultationError::DatabaseError(format!("Failed to parse slots: {}", e)))?;

        let specialist_ids: Vec<Uuid> = slots.iter().map(|slot| slot.specialist_id).collect();
        let usernames = self.fetch_usernames(&specialist_ids, auth_token).await?;

        let slots_by_id: HashMap<Uuid, &Slot> =
            slots.iter().map(|slot| (slot.id, slot)).collect();

        let mut views: Vec<ClientConsultationView> = consultations
            .into_iter()
            .filter_map(|consultation| {
                let slot = slots_by_id.get(&consultation.slot_id)?;
                Some(ClientConsultationView {
                    id: consultation.id,
                    specialist_username: usernames
                        .get(&slot.specialist_id)
                        .cloned()
                        .unwrap_or_default(),
                    slot_id: slot.id,
                    date: slot.date,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                    status: consultation.status,
                    status_display: consultation.status.display_name().to_string(),
                    is_canceled: consultation.is_canceled,
                })
            })
            .collect();

        views.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(views)
    }

    async fn fetch_consultations(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        debug!("Fetching consultations: {}", path);

        let result: Vec<Value> = self
            .supabase_client
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Consultation>, _>>()
            .map_err(|e| {
                ConsultationError::DatabaseError(format!("Failed to parse consultations: {}", e))
            })
    }

    async fn fetch_usernames(
        &self,
        user_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<HashMap<Uuid, String>, ConsultationError> {
        let mut ids: Vec<String> = user_ids.iter().map(Uuid::to_string).collect();
        ids.sort();
        ids.dedup();

        let path = format!(
            "/rest/v1/users?id=in.({})&select=id,username",
            ids.join(",")
        );
        let rows: Vec<UserRow> = self
            .supabase_client
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(|row| (row.id, row.username)).collect())
    }
}
