use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;

use crate::auth::token::authenticate_token;
use crate::error::AppError;

/// Bearer-token gate for the `/api` scope.
///
/// Every request except registration and login must carry
/// `Authorization: Bearer <token>` where the token resolves to a row in
/// `api_tokens`. On success the owning user's id is inserted into request
/// extensions for `CurrentUserId` to pick up; otherwise the request is
/// rejected with 401 before reaching any handler.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

/// Short-circuits `req` with the HTTP response `err` renders to, the same
/// response the server would produce if the error were propagated.
fn reject<B>(req: ServiceRequest, err: AppError) -> ServiceResponse<EitherBody<B>> {
    let res = err.error_response().map_into_right_body();
    req.into_response(res)
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Registration and login are the only ungated endpoints in scope.
        let path = req.path();
        if path == "/api/register" || path == "/api/login" {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|value| value.to_string());

        let pool = req.app_data::<web::Data<PgPool>>().cloned();
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = match token {
                Some(token) => token,
                None => {
                    return Ok(reject(req, AppError::Unauthorized("Unauthenticated".into())));
                }
            };

            let pool = match pool {
                Some(pool) => pool,
                None => {
                    return Ok(reject(
                        req,
                        AppError::InternalServerError("Database pool not configured".into()),
                    ));
                }
            };

            // Token lookup doubles as revocation check: a token deleted at
            // logout simply no longer resolves.
            let user_id = match authenticate_token(&pool, &token).await {
                Ok(user_id) => user_id,
                Err(err) => return Ok(reject(req, err)),
            };
            req.extensions_mut().insert::<i32>(user_id);

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}
