use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Liveness probe. Sits outside the `/api` scope so it needs no token.
///
/// Reports the service name and version along with the current server time,
/// which lets a load balancer distinguish this API from whatever else might
/// answer on the port.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now()
    }))
}
