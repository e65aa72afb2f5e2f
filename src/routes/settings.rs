use actix_web::{web, HttpResponse};

use crate::auth::BearerAuth;
use crate::error::AppResult;
use crate::models::UpdateSettings;
use crate::state::AppState;

/// GET /api/settings - Current hostel settings
pub async fn get_settings(
    state: web::Data<AppState>,
    _auth: BearerAuth,
) -> AppResult<HttpResponse> {
    let settings = state.settings.get().await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// PUT /api/settings - Update hostel settings, omitted fields are kept
pub async fn update_settings(
    state: web::Data<AppState>,
    _auth: BearerAuth,
    body: web::Json<UpdateSettings>,
) -> AppResult<HttpResponse> {
    let settings = state.settings.update(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// Configure settings routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/settings")
            .route(web::get().to(get_settings))
            .route(web::put().to(update_settings)),
    );
}
