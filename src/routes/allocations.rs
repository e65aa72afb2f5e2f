use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::BearerAuth;
use crate::error::AppResult;
use crate::models::{CreateAllocation, UpdatePaymentStatus};
use crate::services::AllocationService;
use crate::state::AppState;

/// POST /api/allocations - Claim a room for a student
pub async fn create_allocation(
    state: web::Data<AppState>,
    _auth: BearerAuth,
    body: web::Json<CreateAllocation>,
) -> AppResult<HttpResponse> {
    let allocation = AllocationService::allocate(
        state.store(),
        &state.settings,
        body.into_inner(),
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Created().json(allocation))
}

/// GET /api/allocations/{id} - Get an allocation by ID
pub async fn get_allocation(
    state: web::Data<AppState>,
    _auth: BearerAuth,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let allocation = AllocationService::get(state.store(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(allocation))
}

/// PUT /api/allocations/{id}/payment-status - Record a payment decision
pub async fn update_payment_status(
    state: web::Data<AppState>,
    _auth: BearerAuth,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePaymentStatus>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let allocation = AllocationService::update_payment_status(
        state.store(),
        path.into_inner(),
        body.payment_status,
        body.payment_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(allocation))
}

/// Configure allocation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/allocations")
            .route("", web::post().to(create_allocation))
            .route("/{id}", web::get().to(get_allocation))
            .route("/{id}/payment-status", web::put().to(update_payment_status)),
    );
}
