use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{HostelSettings, UpdateSettings};
use crate::store::AllocationStore;

/// Accessor for the hostel settings singleton.
///
/// Every read goes to the store, so a write made by another instance is
/// seen by the next sweep.
pub struct SettingsService {
    store: Arc<dyn AllocationStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn AllocationStore>) -> Self {
        Self { store }
    }

    /// Current settings, falling back to defaults when none were saved
    pub async fn get(&self) -> AppResult<HostelSettings> {
        let settings = self.store.get_settings().await?.unwrap_or_default();

        // A stored record that fails validation is a data problem, not a bad request
        settings
            .validate()
            .map_err(|e| AppError::Internal(format!("Malformed hostel settings: {}", e)))?;

        Ok(settings)
    }

    /// Merges `update` onto the stored settings and saves the result
    pub async fn update(&self, update: UpdateSettings) -> AppResult<HostelSettings> {
        let current = self.store.get_settings().await?.unwrap_or_default();
        let settings = update.apply(current);
        settings.validate()?;
        self.store.save_settings(&settings).await?;

        log::info!(
            "Hostel settings updated (grace period: {}h, auto-revoke: {})",
            settings.payment_grace_period,
            settings.auto_revoke_unpaid_allocations
        );

        Ok(settings)
    }

    /// Writes the defaults when the store has no settings yet
    pub async fn seed_defaults(&self) -> AppResult<bool> {
        if self.store.get_settings().await?.is_some() {
            return Ok(false);
        }
        self.store.save_settings(&HostelSettings::default()).await?;
        Ok(true)
    }
}
