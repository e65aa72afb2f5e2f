use log::{info, warn};
use std::sync::Arc;

use crate::auth::generate_token;
use crate::config::{Config, StorageBackend};
use crate::error::{AppError, AppResult};
use crate::services::SettingsService;
use crate::store::{AllocationStore, MemoryStore, PgStore};

/// Connects the allocation store selected by `STORAGE_BACKEND`
pub async fn build_store(config: &Config) -> AppResult<Arc<dyn AllocationStore>> {
    match config.storage {
        StorageBackend::Postgres => {
            let database = config.database.as_ref().ok_or_else(|| {
                AppError::Internal("Database configuration missing".to_string())
            })?;

            Ok(Arc::new(PgStore::connect(database).await?))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory allocation store; all data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Writes default hostel settings when none exist yet
pub async fn seed_settings_if_needed(settings: &SettingsService) -> AppResult<()> {
    if settings.seed_defaults().await? {
        info!("No hostel settings found, default settings created");
    } else {
        info!("Hostel settings already exist, skipping defaults");
    }
    Ok(())
}

/// Without a configured token every API call is rejected; say so loudly
pub fn warn_if_token_missing(config: &Config) {
    if config.security.payment_check_token.is_some() {
        return;
    }

    warn!("PAYMENT_CHECK_TOKEN not set, all /api routes will answer 401");

    // Print to stderr directly (not logs) to keep a usable secret out of log aggregators
    eprintln!();
    eprintln!("==============================================");
    eprintln!("PAYMENT_CHECK_TOKEN IS NOT SET");
    eprintln!("Suggested value: {}", generate_token());
    eprintln!("Set it in the environment and restart.");
    eprintln!("==============================================");
    eprintln!();
}
