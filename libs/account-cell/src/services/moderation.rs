// libs/account-cell/src/services/moderation.rs
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AccountError, UserRecord};

pub struct ModerationService {
    supabase_client: SupabaseClient,
}

impl ModerationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase_client: SupabaseClient::new(config),
        }
    }

    pub async fn block(&self, user_id: Uuid, auth_token: &str) -> Result<UserRecord, AccountError> {
        let user = self
            .find_by_id(user_id, auth_token)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        if user.is_blocked {
            return Err(AccountError::AlreadyBlocked);
        }

        let blocked = self.set_blocked(user_id, true, auth_token).await?;
        info!("User {} blocked", user_id);
        Ok(blocked)
    }

    pub async fn unblock(
        &self,
        user_id: Uuid,
        auth_token: &str,
    ) -> Result<UserRecord, AccountError> {
        let user = self
            .find_by_id(user_id, auth_token)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        if !user.is_blocked {
            return Err(AccountError::NotBlocked);
        }

        let unblocked = self.set_blocked(user_id, false, auth_token).await?;
        info!("User {} unblocked", user_id);
        Ok(unblocked)
    }

    async fn find_by_id(
        &self,
        user_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<UserRecord>, AccountError> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<Value> = self
            .supabase_client
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| AccountError::DatabaseError(format!("Failed to parse user: {}", e))),
            None => Ok(None),
        }
    }

    async fn set_blocked(
        &self,
        user_id: Uuid,
        blocked: bool,
        auth_token: &str,
    ) -> Result<UserRecord, AccountError> {
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
                Some(auth_token),
                Some(json!({ "is_blocked": blocked })),
                Some(headers),
            )
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AccountError::UserNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse user: {}", e)))
    }
}
