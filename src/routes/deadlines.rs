use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::future::Future;

use crate::auth::BearerAuth;
use crate::error::{AppError, AppResult};
use crate::services::SweepService;
use crate::state::AppState;

/// POST /api/check-payment-deadlines - Revoke expired unpaid allocations
pub async fn check_payment_deadlines(
    state: web::Data<AppState>,
    _auth: BearerAuth, // Verified before any store access
) -> AppResult<HttpResponse> {
    let summary = with_timeout(
        &state,
        SweepService::run(state.store(), &state.settings, state.policy, Utc::now()),
    )
    .await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// GET /api/check-payment-deadlines - Report what a sweep would revoke, without writing
pub async fn payment_deadline_status(
    state: web::Data<AppState>,
    _auth: BearerAuth,
) -> AppResult<HttpResponse> {
    let status = with_timeout(
        &state,
        SweepService::status(state.store(), &state.settings, state.policy, Utc::now()),
    )
    .await?;

    Ok(HttpResponse::Ok().json(status))
}

/// POST /api/mark-overdue-payments - Flag pending allocations past their deadline
pub async fn mark_overdue_payments(
    state: web::Data<AppState>,
    _auth: BearerAuth,
) -> AppResult<HttpResponse> {
    let summary = with_timeout(&state, SweepService::mark_overdue(state.store(), Utc::now())).await?;

    Ok(HttpResponse::Ok().json(summary))
}

async fn with_timeout<T>(
    state: &AppState,
    work: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::time::timeout(state.sweep_timeout, work)
        .await
        .map_err(|_| {
            log::error!(
                "Payment deadline request exceeded {}s",
                state.sweep_timeout.as_secs()
            );
            AppError::Timeout(format!(
                "Payment deadline check did not finish within {}s",
                state.sweep_timeout.as_secs()
            ))
        })?
}

/// Configure payment deadline routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/check-payment-deadlines")
            .route(web::post().to(check_payment_deadlines))
            .route(web::get().to(payment_deadline_status)),
    )
    .route(
        "/api/mark-overdue-payments",
        web::post().to(mark_overdue_payments),
    );
}
