use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::BearerAuth;
use crate::error::AppResult;
use crate::models::{CreateHostel, ReserveRoom};
use crate::services::HostelService;
use crate::state::AppState;

/// POST /api/hostels - Seed a hostel with floors and rooms
pub async fn create_hostel(
    state: web::Data<AppState>,
    _auth: BearerAuth,
    body: web::Json<CreateHostel>,
) -> AppResult<HttpResponse> {
    let hostel = HostelService::create(state.store(), &state.settings, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(hostel))
}

/// GET /api/rooms/{id} - Inspect a room's occupancy
pub async fn get_room(
    state: web::Data<AppState>,
    _auth: BearerAuth,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let room = HostelService::get_room(state.store(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(room))
}

/// POST /api/rooms/{id}/reserve - Hold a room back from claims
pub async fn reserve_room(
    state: web::Data<AppState>,
    _auth: BearerAuth,
    path: web::Path<Uuid>,
    body: web::Json<ReserveRoom>,
) -> AppResult<HttpResponse> {
    let room = HostelService::reserve_room(
        state.store(),
        path.into_inner(),
        body.into_inner(),
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(room))
}

/// POST /api/rooms/{id}/unreserve - Lift a hold
pub async fn unreserve_room(
    state: web::Data<AppState>,
    _auth: BearerAuth,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let room = HostelService::unreserve_room(state.store(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(room))
}

/// Configure inventory routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/hostels", web::post().to(create_hostel))
        .route("/api/rooms/{id}", web::get().to(get_room))
        .route("/api/rooms/{id}/reserve", web::post().to(reserve_room))
        .route("/api/rooms/{id}/unreserve", web::post().to(unreserve_room));
}
