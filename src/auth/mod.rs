pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use crate::models::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::CurrentUserId;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{authenticate_token, issue_token, revoke_tokens};

/// Payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name for the new account, at most 50 characters.
    #[validate(length(min = 1, max = 50, message = "The name may not be greater than 50 characters."))]
    pub name: String,

    /// Email address for the new account. Must be a valid email format;
    /// uniqueness is checked against the database in the handler.
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    /// Password for the new account, at least 8 characters, and it must
    /// match `password_confirmation`.
    #[validate(
        length(min = 8, message = "The password must be at least 8 characters."),
        must_match(other = "password_confirmation", message = "The password confirmation does not match.")
    )]
    pub password: String,

    pub password_confirmation: String,
}

/// Payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

/// Response body after successful registration or login: the user record
/// (password excluded) plus a freshly issued bearer token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}
