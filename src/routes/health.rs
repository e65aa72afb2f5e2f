use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct LivenessResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    store: &'static str,
}

/// Liveness check - is the process running?
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(LivenessResponse { status: "ok" })
}

/// Readiness check - can the allocation store be reached?
/// Returns 200 when it can, 503 otherwise.
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let (status, store_status, http_status) = if state.store().health_check().await {
        ("ready", "ok", StatusCode::OK)
    } else {
        ("not_ready", "error", StatusCode::SERVICE_UNAVAILABLE)
    };

    HttpResponse::build(http_status).json(ReadinessResponse {
        status,
        checks: ReadinessChecks {
            store: store_status,
        },
    })
}

/// Configure health routes (no auth)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
