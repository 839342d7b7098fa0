// libs/slot-cell/src/handlers.rs
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

use crate::models::{CreateSlotRequest, SlotError, UpdateSlotRequest};
use crate::services::slot::SlotService;

#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::CreateSlot, TargetOwnership::None)?;

    let slot_service = SlotService::new(&state);
    let slot = slot_service
        .create_slot(user.id, request, auth.token())
        .await
        .map_err(|e| match e {
            SlotError::Overlap => AppError::Conflict(e.to_string()),
            SlotError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "slot": slot,
        "message": "Slot created"
    })))
}

#[axum::debug_handler]
pub async fn get_my_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::ListOwnSlots, TargetOwnership::None)?;

    let slot_service = SlotService::new(&state);
    let slots = slot_service
        .list_own_slots(user.id, auth.token())
        .await
        .map_err(|e| match e {
            SlotError::DatabaseError(msg) => AppError::Database(msg),
            other => AppError::BadRequest(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_open_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::ListOpenSlots, TargetOwnership::None)?;

    let slot_service = SlotService::new(&state);
    let slots = slot_service
        .list_open_slots(auth.token())
        .await
        .map_err(|e| match e {
            SlotError::DatabaseError(msg) => AppError::Database(msg),
            other => AppError::BadRequest(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn update_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(slot_id): Path<Uuid>,
    Json(request): Json<UpdateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::UpdateSlot, TargetOwnership::None)?;

    let slot_service = SlotService::new(&state);
    let slot = slot_service
        .update_slot(slot_id, user.id, request, auth.token())
        .await
        .map_err(|e| match e {
            SlotError::SlotNotFound => AppError::NotFound(e.to_string()),
            SlotError::SpecialistNotFound => AppError::NotFound(e.to_string()),
            SlotError::Overlap => AppError::Conflict(e.to_string()),
            SlotError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "slot": slot
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::DeleteSlot, TargetOwnership::None)?;

    let slot_service = SlotService::new(&state);
    slot_service
        .delete_slot(slot_id, user.id, auth.token())
        .await
        .map_err(|e| match e {
            SlotError::SlotNotFound => AppError::NotFound(e.to_string()),
            SlotError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Slot deleted"
    })))
}
