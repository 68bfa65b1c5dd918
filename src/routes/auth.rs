use crate::{
    auth::{
        hash_password, issue_token, revoke_tokens, verify_password, AuthResponse, CurrentUserId,
        LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::{User, UserCredentials},
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user.
///
/// Creates the account with a bcrypt-hashed password and returns the user
/// together with a freshly issued bearer token.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    // Uniqueness is a database question, not a derive rule.
    let existing_user =
        sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE email = $1")
            .bind(&register_data.email)
            .fetch_optional(&**pool)
            .await?;

    if existing_user.is_some() {
        return Err(AppError::field_error(
            "email",
            "unique",
            "The email has already been taken.",
        ));
    }

    let password_hash = hash_password(&register_data.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3)
         RETURNING id, name, email, created_at, updated_at",
    )
    .bind(&register_data.name)
    .bind(&register_data.email)
    .bind(password_hash)
    .fetch_one(&**pool)
    .await?;

    let token = issue_token(&pool, user.id).await?;

    Ok(HttpResponse::Created().json(AuthResponse { user, token }))
}

/// Login a user.
///
/// Unknown email and wrong password produce the identical 401 body so the
/// endpoint cannot be used to enumerate accounts.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let credentials = sqlx::query_as::<_, UserCredentials>(
        "SELECT id, name, email, password_hash, created_at, updated_at
         FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match credentials {
        Some(credentials) => {
            if verify_password(&login_data.password, &credentials.password_hash)? {
                let token = issue_token(&pool, credentials.id).await?;
                Ok(HttpResponse::Ok().json(AuthResponse {
                    user: credentials.into(),
                    token,
                }))
            } else {
                Err(AppError::Unauthorized("Invalid Credentials".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid Credentials".into())),
    }
}

/// Logout the authenticated user.
///
/// Revokes every token the user holds, not just the one presented. Any
/// request made with a revoked token afterwards fails with 401.
#[post("/logout")]
pub async fn logout(
    pool: web::Data<PgPool>,
    user: CurrentUserId,
) -> Result<impl Responder, AppError> {
    revoke_tokens(&pool, user.0).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Logged out successfully."
    })))
}
