// libs/consultation-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::policy::{authorize, Action, TargetOwnership};

use crate::models::{
    CancelConsultationRequest, ConsultationError, CreateConsultationRequest,
    DecideConsultationRequest,
};
use crate::services::booking::ConsultationBookingService;
use crate::services::decision::ConsultationDecisionService;

#[axum::debug_handler]
pub async fn request_consultation(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::RequestConsultation, TargetOwnership::None)?;

    let booking_service = ConsultationBookingService::new(&state);
    let consultation = booking_service
        .request_consultation(user.id, request.slot_id, auth.token())
        .await
        .map_err(|e| match e {
            ConsultationError::SlotNotFound => AppError::NotFound(e.to_string()),
            ConsultationError::AlreadyAccepted => AppError::Conflict(e.to_string()),
            ConsultationError::DuplicateRequest => AppError::Conflict(e.to_string()),
            ConsultationError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation,
        "message": "Consultation requested"
    })))
}

#[axum::debug_handler]
pub async fn get_specialist_consultations(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::ListSpecialistConsultations, TargetOwnership::None)?;

    let booking_service = ConsultationBookingService::new(&state);
    let consultations = booking_service
        .list_specialist_consultations(user.id, auth.token())
        .await
        .map_err(|e| match e {
            ConsultationError::DatabaseError(msg) => AppError::Database(msg),
            other => AppError::BadRequest(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "consultations": consultations
    })))
}

#[axum::debug_handler]
pub async fn get_my_consultations(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::ListClientConsultations, TargetOwnership::None)?;

    let booking_service = ConsultationBookingService::new(&state);
    let consultations = booking_service
        .list_client_consultations(user.id, auth.token())
        .await
        .map_err(|e| match e {
            ConsultationError::DatabaseError(msg) => AppError::Database(msg),
            other => AppError::BadRequest(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "consultations": consultations
    })))
}

#[axum::debug_handler]
pub async fn update_consultation_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(consultation_id): Path<Uuid>,
    Json(request): Json<DecideConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::DecideConsultation, TargetOwnership::None)?;

    let decision_service = ConsultationDecisionService::new(&state);
    let consultation = decision_service
        .update_status(&user, consultation_id, request.status, auth.token())
        .await
        .map_err(|e| match e {
            ConsultationError::NotFound => AppError::NotFound(e.to_string()),
            ConsultationError::SlotNotFound => AppError::NotFound(e.to_string()),
            ConsultationError::Forbidden(msg) => AppError::Forbidden(msg),
            ConsultationError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation
    })))
}

#[axum::debug_handler]
pub async fn cancel_consultation(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(consultation_id): Path<Uuid>,
    Json(request): Json<CancelConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::CancelConsultation, TargetOwnership::None)?;

    let decision_service = ConsultationDecisionService::new(&state);
    let consultation = decision_service
        .cancel(&user, consultation_id, request, auth.token())
        .await
        .map_err(|e| match e {
            ConsultationError::NotFound => AppError::NotFound(e.to_string()),
            ConsultationError::Forbidden(msg) => AppError::Forbidden(msg),
            ConsultationError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation,
        "message": "Consultation canceled"
    })))
}
