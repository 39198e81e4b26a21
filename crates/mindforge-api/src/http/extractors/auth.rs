//! API key authentication extractor.
//!
//! Extracts and verifies API keys from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//!
//! Keys are SHA-256 hashed and looked up in the `api_keys` table; each key
//! belongs to exactly one user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mindforge_infra::sqlite::user::SqliteUserRepository;
use mindforge_types::chat::User;
use mindforge_types::error::RepositoryError;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::state::AppState;

/// Length of the non-secret key head stored for display.
const KEY_PREFIX_LEN: usize = 11;

/// The user owning the presented API key.
pub struct Authenticated(pub User);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(parts)?;
        let key_hash = hash_api_key(&api_key);

        match state.users.find_by_key_hash(&key_hash).await? {
            Some(user) => Ok(Authenticated(user)),
            None => Err(AppError::Unauthorized(
                "Invalid API key. Provide a valid key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
            )),
        }
    }
}

/// Extract the API key from request headers.
fn extract_api_key(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing API key. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
    ))
}

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

/// A fresh plaintext key: `mf_` followed by 64 random hex characters.
pub fn generate_api_key() -> String {
    format!("mf_{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Generate a key for `user_id`, store its hash and return the plaintext.
///
/// The plaintext is never stored; callers must show it to the user once.
pub async fn issue_api_key(
    users: &SqliteUserRepository,
    user_id: &Uuid,
) -> Result<String, RepositoryError> {
    let key = generate_api_key();
    users
        .add_api_key(user_id, &hash_api_key(&key), &key[..KEY_PREFIX_LEN])
        .await?;
    Ok(key)
}
