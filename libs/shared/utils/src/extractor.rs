use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};
use reqwest::Method;
use serde::Deserialize;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::jwt::validate_token;

fn bearer_token(request: &Request<Body>) -> Result<&str, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(&auth_value[7..])
}

// Middleware for authentication - validates the bearer token and stores the
// authenticated identity in request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;

    let user = validate_token(token, &config.jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[derive(Deserialize)]
struct AccountFlags {
    is_blocked: bool,
    is_active: bool,
}

/// Middleware layered after `auth_middleware`: re-reads the account row so a
/// block applied after token issuance takes effect on the next request.
pub async fn account_gate(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))?;

    let token = bearer_token(&request)?.to_string();

    let client = SupabaseClient::new(&config);
    let path = format!("/rest/v1/users?id=eq.{}&select=is_blocked,is_active", user.id);
    let rows: Vec<AccountFlags> = client
        .request(Method::GET, &path, Some(&token), None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let flags = rows
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Auth("Unknown account".to_string()))?;

    if flags.is_blocked {
        return Err(AppError::Forbidden("Your account is blocked".to_string()));
    }
    if !flags.is_active {
        return Err(AppError::Forbidden("Your account is not activated".to_string()));
    }

    Ok(next.run(request).await)
}
