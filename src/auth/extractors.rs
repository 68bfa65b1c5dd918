use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;

/// Extracts the authenticated user's id from request extensions.
///
/// Intended for routes behind `AuthMiddleware`, which validates the bearer
/// token and inserts the owning user's id. If the id is missing the request
/// never passed the gate, so the extractor answers 401.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUserId(pub i32);

impl FromRequest for CurrentUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<i32>().copied() {
            Some(user_id) => ready(Ok(CurrentUserId(user_id))),
            None => {
                let err = AppError::Unauthorized("Unauthenticated".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
