// libs/account-cell/src/services/account.rs
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use notification_cell::{NotificationEvent, NotificationService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{TokenResponse, UserRole};
use shared_utils::jwt::{
    issue_access_token, issue_confirmation_token, validate_confirmation_token,
    ACCESS_TOKEN_HOURS,
};

use crate::models::{AccountError, LoginRequest, RegisterRequest, UserRecord};

pub struct AccountService {
    supabase_client: SupabaseClient,
    notification_service: NotificationService,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase_client: SupabaseClient::new(config),
            notification_service: NotificationService::new(config),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    /// Create an inactive account and hand back the confirmation token the
    /// caller must present to activate it.
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<(UserRecord, String), AccountError> {
        if request.password != request.password_confirm {
            return Err(AccountError::PasswordMismatch);
        }

        let probe_path = format!(
            "/rest/v1/users?username=eq.{}&select=id",
            urlencoding::encode(&request.username)
        );
        let existing: Vec<Value> = self
            .supabase_client
            .request(Method::GET, &probe_path, None, None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;
        if !existing.is_empty() {
            return Err(AccountError::UsernameTaken);
        }

        let password_hash = hash_password(&request.password)?;
        let role: UserRole = request.role.into();

        let user_data = json!({
            "username": request.username,
            "email": request.email,
            "password_hash": password_hash,
            "role": role,
            "is_blocked": false,
            "is_active": false
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
                "/rest/v1/users",
                None,
                Some(user_data),
                Some(headers),
            )
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AccountError::DatabaseError(
                "Failed to create user".to_string(),
            ));
        }

        let user: UserRecord = serde_json::from_value(result[0].clone())
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse user: {}", e)))?;

        let confirmation_token =
            issue_confirmation_token(user.id, &self.jwt_secret).map_err(AccountError::Internal)?;

        info!(
            "Registered user {} ({}) as {}, confirmation pending",
            user.id, user.username, user.role
        );
        self.notification_service
            .notify(NotificationEvent::RegistrationPending, user.id);

        Ok((user, confirmation_token))
    }

    /// Redeem a confirmation token and activate the account it names.
    pub async fn confirm(&self, token: &str) -> Result<UserRecord, AccountError> {
        let user_id = validate_confirmation_token(token, &self.jwt_secret)
            .map_err(AccountError::InvalidToken)?;

        debug!("Activating account {}", user_id);

        let path = format!("/rest/v1/users?id=eq.{}", user_id);
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
                None,
                Some(json!({ "is_active": true })),
                Some(headers),
            )
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AccountError::UserNotFound);
        }

        let user: UserRecord = serde_json::from_value(result[0].clone())
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse user: {}", e)))?;

        info!("Account {} activated", user.id);
        Ok(user)
    }

    /// Verify credentials and issue the bearer token. The same
    /// `InvalidCredentials` answer covers unknown usernames and wrong
    /// passwords, so callers cannot probe which accounts exist.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AccountError> {
        let user = self
            .find_by_username(&request.username)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AccountError::InvalidCredentials);
        }

        if user.is_blocked {
            return Err(AccountError::Blocked);
        }
        if !user.is_active {
            return Err(AccountError::NotActivated);
        }

        let access_token = issue_access_token(user.id, &user.username, user.role, &self.jwt_secret)
            .map_err(AccountError::Internal)?;

        info!("User {} ({}) logged in", user.id, user.username);
        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: ACCESS_TOKEN_HOURS * 3600,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError> {
        let path = format!(
            "/rest/v1/users?username=eq.{}",
            urlencoding::encode(username)
        );
        let result: Vec<Value> = self
            .supabase_client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| AccountError::DatabaseError(format!("Failed to parse user: {}", e))),
            None => Ok(None),
        }
    }
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AccountError::Internal(format!("Stored password hash is invalid: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
