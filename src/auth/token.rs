//! Opaque bearer token issuance and validation.
//!
//! Tokens are random 40-character alphanumeric strings handed to the client
//! exactly once. Only the SHA-256 hash is stored, in the `api_tokens` table,
//! so a database leak does not expose usable credentials. A user may hold
//! any number of tokens at once; logout deletes all of them.

use crate::error::AppError;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Length of an issued token in characters.
pub const TOKEN_LENGTH: usize = 40;

/// Issues a fresh token for `user_id` and returns the plaintext.
///
/// The plaintext is not recoverable afterwards; only its hash is persisted.
pub async fn issue_token(pool: &PgPool, user_id: i32) -> Result<String, AppError> {
    let token = generate_token_string();
    let token_hash = hash_token(&token);

    sqlx::query("INSERT INTO api_tokens (id, user_id, token_hash) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolves a presented bearer token to the owning user's id.
///
/// Returns `AppError::Unauthorized` when no stored token matches, which
/// covers both never-issued and revoked tokens.
pub async fn authenticate_token(pool: &PgPool, token: &str) -> Result<i32, AppError> {
    let token_hash = hash_token(token);

    let row = sqlx::query_as::<_, (i32,)>(
        "SELECT user_id FROM api_tokens WHERE token_hash = $1",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((user_id,)) => Ok(user_id),
        None => Err(AppError::Unauthorized("Unauthenticated".into())),
    }
}

/// Deletes every token belonging to `user_id`. Returns how many were revoked.
pub async fn revoke_tokens(pool: &PgPool, user_id: i32) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM api_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Generates a random alphanumeric token string (base62 charset).
fn generate_token_string() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hex-encoded SHA-256 hash of a token, as stored in `api_tokens`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();

    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
