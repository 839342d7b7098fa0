use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            redis_url: None,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

impl TestUser {
    pub fn new(username: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            role: role.to_string(),
        }
    }

    pub fn specialist(username: &str) -> Self {
        Self::new(username, "Specialist")
    }

    pub fn client(username: &str) -> Self {
        Self::new(username, "Client")
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, "Admin")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).expect("test user id is a uuid")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.uuid(),
            username: self.username.clone(),
            role: self.role.parse().expect("test user role is valid"),
            is_blocked: false,
        }
    }
}

impl Default for TestUser {
    fn default() -> Self {
        Self::client("test-client")
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "username": user.username,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned PostgREST rows for wiremock bodies.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn account_flags_row(is_blocked: bool, is_active: bool) -> serde_json::Value {
        json!({
            "is_blocked": is_blocked,
            "is_active": is_active
        })
    }

    pub fn user_row(user: &TestUser, is_blocked: bool, is_active: bool) -> serde_json::Value {
        json!({
            "id": user.id,
            "username": user.username,
            "email": format!("{}@example.com", user.username),
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$placeholder",
            "role": user.role,
            "is_blocked": is_blocked,
            "is_active": is_active,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn slot_row(
        id: Uuid,
        specialist_id: &str,
        date: &str,
        start_time: &str,
        end_time: &str,
        is_available: bool,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "specialist_id": specialist_id,
            "date": date,
            "start_time": start_time,
            "end_time": end_time,
            "duration_minutes": 30,
            "context": null,
            "is_available": is_available
        })
    }

    pub fn consultation_row(
        id: Uuid,
        slot_id: Uuid,
        client_id: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "slot_id": slot_id,
            "client_id": client_id,
            "status": status,
            "is_canceled": false,
            "cancel_reason": null,
            "cancel_comment": null,
            "is_completed": false
        })
    }
}
