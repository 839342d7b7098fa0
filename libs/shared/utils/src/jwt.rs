use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{JwtClaims, User, UserRole};

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_TOKEN_HOURS: i64 = 24;
pub const CONFIRMATION_TOKEN_HOURS: i64 = 24;

const CONFIRMATION_PURPOSE: &str = "confirm";

fn sign(signing_input: &str, jwt_secret: &str) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();
    Ok(URL_SAFE_NO_PAD.encode(signature))
}

fn encode_token(payload: serde_json::Value, jwt_secret: &str) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let header = json!({ "alg": "HS256", "typ": "JWT" });

    let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload.to_string());
    let signing_input = format!("{}.{}", header_b64, payload_b64);
    let signature_b64 = sign(&signing_input, jwt_secret)?;

    Ok(format!("{}.{}", signing_input, signature_b64))
}

/// Issues the bearer token returned by login.
pub fn issue_access_token(
    user_id: Uuid,
    username: &str,
    role: UserRole,
    jwt_secret: &str,
) -> Result<String, String> {
    let now = Utc::now();
    let exp = now + Duration::hours(ACCESS_TOKEN_HOURS);

    let payload = json!({
        "sub": user_id.to_string(),
        "username": username,
        "role": role.as_str(),
        "iat": now.timestamp(),
        "exp": exp.timestamp()
    });

    encode_token(payload, jwt_secret)
}

/// Issues the single-purpose token mailed out for registration confirmation.
/// Carries a `purpose` claim so it can never pass as an access token.
pub fn issue_confirmation_token(user_id: Uuid, jwt_secret: &str) -> Result<String, String> {
    let now = Utc::now();
    let exp = now + Duration::hours(CONFIRMATION_TOKEN_HOURS);

    let payload = json!({
        "sub": user_id.to_string(),
        "purpose": CONFIRMATION_PURPOSE,
        "iat": now.timestamp(),
        "exp": exp.timestamp()
    });

    encode_token(payload, jwt_secret)
}

fn decode_claims(token: &str, jwt_secret: &str) -> Result<JwtClaims, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| "Invalid claims encoding".to_string())?;

    let claims: JwtClaims = serde_json::from_str(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        "Invalid claims format".to_string()
    })?;

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    Ok(claims)
}

/// Verifies an access token and rebuilds the authenticated identity.
/// Single-purpose tokens (confirmation) are rejected here.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    let claims = decode_claims(token, jwt_secret)?;

    if claims.purpose.is_some() {
        return Err("Not an access token".to_string());
    }

    let id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid subject claim".to_string())?;
    let username = claims.username.ok_or_else(|| "Missing username claim".to_string())?;
    let role = claims
        .role
        .as_deref()
        .ok_or_else(|| "Missing role claim".to_string())
        .and_then(|r| UserRole::from_str(r).map_err(|_| "Invalid role claim".to_string()))?;

    let user = User {
        id,
        username,
        role,
        is_blocked: false,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

/// Verifies a registration-confirmation token and returns the account id.
pub fn validate_confirmation_token(token: &str, jwt_secret: &str) -> Result<Uuid, String> {
    let claims = decode_claims(token, jwt_secret)?;

    if claims.purpose.as_deref() != Some(CONFIRMATION_PURPOSE) {
        return Err("Not a confirmation token".to_string());
    }

    Uuid::parse_str(&claims.sub).map_err(|_| "Invalid subject claim".to_string())
}
