// libs/account-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::policy::{authorize, Action, TargetOwnership};

use crate::models::{AccountError, BlockUserRequest, LoginRequest, RegisterRequest};
use crate::services::account::AccountService;
use crate::services::moderation::ModerationService;

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(&state);
    let (_, confirmation_token) = account_service
        .register(request)
        .await
        .map_err(|e| match e {
            AccountError::UsernameTaken => AppError::Conflict(e.to_string()),
            AccountError::DatabaseError(msg) => AppError::Database(msg),
            AccountError::Internal(msg) => AppError::Internal(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    // No mailer runs in-process; the token rides along so the account can
    // be activated while the notification consumer owns actual delivery.
    Ok(Json(json!({
        "success": true,
        "message": "Registration successful, confirm your account to activate it",
        "confirmation_token": confirmation_token
    })))
}

#[axum::debug_handler]
pub async fn confirm(
    State(state): State<Arc<AppConfig>>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(&state);
    account_service.confirm(&token).await.map_err(|e| match e {
        AccountError::InvalidToken(msg) => AppError::Auth(msg),
        AccountError::UserNotFound => AppError::NotFound(e.to_string()),
        AccountError::DatabaseError(msg) => AppError::Database(msg),
        _ => AppError::BadRequest(e.to_string()),
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "Account activated"
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(&state);
    let tokens = account_service.login(request).await.map_err(|e| match e {
        AccountError::InvalidCredentials => AppError::Auth(e.to_string()),
        AccountError::Blocked => AppError::Forbidden(e.to_string()),
        AccountError::NotActivated => AppError::Forbidden(e.to_string()),
        AccountError::DatabaseError(msg) => AppError::Database(msg),
        AccountError::Internal(msg) => AppError::Internal(msg),
        _ => AppError::BadRequest(e.to_string()),
    })?;

    Ok(Json(json!({
        "success": true,
        "access_token": tokens.access_token,
        "token_type": tokens.token_type,
        "expires_in": tokens.expires_in
    })))
}

#[axum::debug_handler]
pub async fn block_user(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BlockUserRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::BlockUser, TargetOwnership::None)?;

    let moderation_service = ModerationService::new(&state);
    moderation_service
        .block(request.user_id, auth.token())
        .await
        .map_err(|e| match e {
            AccountError::UserNotFound => AppError::NotFound(e.to_string()),
            AccountError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "User blocked"
    })))
}

#[axum::debug_handler]
pub async fn unblock_user(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BlockUserRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&user, Action::UnblockUser, TargetOwnership::None)?;

    let moderation_service = ModerationService::new(&state);
    moderation_service
        .unblock(request.user_id, auth.token())
        .await
        .map_err(|e| match e {
            AccountError::UserNotFound => AppError::NotFound(e.to_string()),
            AccountError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::BadRequest(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "User unblocked"
    })))
}
