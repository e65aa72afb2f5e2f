use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::state::AppState;

/// Extractor for the shared-secret Bearer credential.
///
/// Runs before the handler body, so a rejected request never reaches the
/// store.
///
/// Usage in handlers:
/// ```ignore
/// async fn my_handler(_auth: BearerAuth) -> HttpResponse {
///     // only reached with a valid token
/// }
/// ```
pub struct BearerAuth;

impl FromRequest for BearerAuth {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authorize(req);
        if let Err(e) = &result {
            log::warn!(
                "Unauthorized {} {} from {}: {}",
                req.method(),
                req.path(),
                req.connection_info().realip_remote_addr().unwrap_or("unknown"),
                e
            );
        }
        ready(result)
    }
}

fn authorize(req: &HttpRequest) -> Result<BearerAuth, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state not configured".to_string()))?;

    let verifier = state
        .api_token
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("API token is not configured".to_string()))?;

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized(
            "Invalid Authorization header format, expected 'Bearer <token>'".to_string(),
        )
    })?;

    if !verifier.verify(token.trim()) {
        return Err(AppError::Unauthorized(
            "Invalid or missing authorization token".to_string(),
        ));
    }

    Ok(BearerAuth)
}
