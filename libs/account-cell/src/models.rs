// libs/account-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::auth::UserRole;

// ==============================================================================
// ACCOUNT MODELS
// ==============================================================================

/// Full user row as stored. Carries the password hash, so it is read-only
/// on the wire: rows deserialize in, nothing here serializes out.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_blocked: bool,
    pub is_active: bool,
}

/// Roles a caller may register as. Admin accounts are provisioned out of
/// band and cannot be self-assigned, so the enum simply does not offer it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RegisterRole {
    Specialist,
    Client,
}

impl From<RegisterRole> for UserRole {
    fn from(role: RegisterRole) -> Self {
        match role {
            RegisterRole::Specialist => UserRole::Specialist,
            RegisterRole::Client => UserRole::Client,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub role: RegisterRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockUserRequest {
    pub user_id: Uuid,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AccountError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("This username is already taken")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Your account is blocked")]
    Blocked,

    #[error("Your account is not activated")]
    NotActivated,

    #[error("User with this id does not exist")]
    UserNotFound,

    #[error("User with this id is already blocked")]
    AlreadyBlocked,

    #[error("User with this id is not blocked")]
    NotBlocked,

    #[error("Invalid confirmation token: {0}")]
    InvalidToken(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
