// libs/consultation-cell/src/services/decision.rs
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use notification_cell::{NotificationEvent, NotificationService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_utils::policy::{authorize, Action, TargetOwnership};
use slot_cell::SlotService;

use crate::models::{
    CancelConsultationRequest, Consultation, ConsultationError, ConsultationStatus,
};

pub struct ConsultationDecisionService {
    supabase_client: SupabaseClient,
    slot_service: SlotService,
    notification_service: NotificationService,
}

impl ConsultationDecisionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase_client: SupabaseClient::new(config),
            slot_service: SlotService::new(config),
            notification_service: NotificationService::new(config),
        }
    }

    /// Accept or reject a pending request. Only the specialist owning the
    /// slot may decide. Accepting closes the slot and rejects every other
    /// request on it in one statement.
    pub async fn update_status(
        &self,
        user: &User,
        consultation_id: Uuid,
        new_status: ConsultationStatus,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        let consultation = self
            .get_consultation(consultation_id, auth_token)
            .await?
            .ok_or(ConsultationError::NotFound)?;

        let slot = self
            .slot_service
            .get_slot(consultation.slot_id, auth_token)
            .await?
            .ok_or(ConsultationError::SlotNotFound)?;

        let ownership = if slot.specialist_id == user.id {
            TargetOwnership::Owned
        } else {
            TargetOwnership::Foreign
        };
        authorize(user, Action::DecideConsultation, ownership)?;

        match new_status {
            ConsultationStatus::Accepted => self.accept(&consultation, auth_token).await,
            ConsultationStatus::Rejected => self.reject(&consultation, auth_token).await,
            ConsultationStatus::Pending => Err(ConsultationError::InvalidStatus),
        }
    }

    /// Cancel the client's own request. The slot reopens regardless of
    /// whether this request was the accepted one.
    pub async fn cancel(
        &self,
        user: &User,
        consultation_id: Uuid,
        request: CancelConsultationRequest,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        let consultation = self
            .get_consultation(consultation_id, auth_token)
            .await?
            .ok_or(ConsultationError::NotFound)?;

        let ownership = if consultation.client_id == user.id {
            TargetOwnership::Owned
        } else {
            TargetOwnership::Foreign
        };
        authorize(user, Action::CancelConsultation, ownership)?;

        if consultation.is_canceled {
            return Err(ConsultationError::AlreadyCanceled);
        }

        let comment = request
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from);
        if request.reason.is_none() && comment.is_none() {
            return Err(ConsultationError::MissingReason);
        }

        let update_data = json!({
            "is_canceled": true,
            "cancel_reason": request.reason,
            "cancel_comment": comment
        });
        let canceled = self
            .patch_consultation(consultation_id, update_data, auth_token)
            .await?;

        self.slot_service
            .set_availability(consultation.slot_id, true, auth_token)
            .await?;

        info!(
            "Consultation {} canceled by client {}",
            consultation_id, user.id
        );
        Ok(canceled)
    }

    async fn accept(
        &self,
        consultation: &Consultation,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        self.slot_service
            .set_availability(consultation.slot_id, false, auth_token)
            .await?;

        // One statement so no competing request can slip through half-done.
        let siblings_path = format!(
            "/rest/v1/consultations?slot_id=eq.{}&id=neq.{}&status=neq.Rejected",
            consultation.slot_id, consultation.id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );
        let rejected: Vec<Value> = self
            .supabase_client
            .request_with_headers(
                Method::PATCH,
                &siblings_path,
                Some(auth_token),
                Some(json!({"status": "Rejected"})),
                Some(headers),
            )
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;
        debug!(
            "Rejected {} competing requests on slot {}",
            rejected.len(),
            consultation.slot_id
        );

        let accepted = self
            .patch_consultation(
                consultation.id,
                json!({"status": ConsultationStatus::Accepted}),
                auth_token,
            )
            .await?;

        info!(
            "Consultation {} accepted, slot {} closed",
            consultation.id, consultation.slot_id
        );
        self.notification_service
            .notify(NotificationEvent::ConsultationAccepted, consultation.id);
        Ok(accepted)
    }

    async fn reject(
        &self,
        consultation: &Consultation,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        let rejected = self
            .patch_consultation(
                consultation.id,
                json!({"status": ConsultationStatus::Rejected}),
                auth_token,
            )
            .await?;

        info!("Consultation {} rejected", consultation.id);
        self.notification_service
            .notify(NotificationEvent::ConsultationRejected, consultation.id);
        Ok(rejected)
    }

    async fn get_consultation(
        &self,
        consultation_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Consultation>, ConsultationError> {
        let path = format!("/rest/v1/consultations?id=eq.{}", consultation_id);
        let result: Vec<Value> = self
            .supabase_client
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| {
                    ConsultationError::DatabaseError(format!("Failed to parse consultation: {}", e))
                }),
            None => Ok(None),
        }
    }

    async fn patch_consultation(
        &self,
        consultation_id: Uuid,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        let path = format!("/rest/v1/consultations?id=eq.{}", consultation_id);
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
                Some(update_data),
                Some(headers),
            )
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ConsultationError::DatabaseError(
                "Failed to update consultation".to_string(),
            ));
        }

        serde_json::from_value(result[0].clone()).map_err(|e| {
            ConsultationError::DatabaseError(format!("Failed to parse consultation: {}", e))
        })
    }
}
