use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::services::{DeadlinePolicy, SettingsService};
use crate::store::AllocationStore;

/// Everything the handlers and the scheduler share
pub struct AppState {
    pub store: Arc<dyn AllocationStore>,
    pub settings: SettingsService,
    pub policy: DeadlinePolicy,
    /// Upper bound for one triggered sweep
    pub sweep_timeout: Duration,
    /// `None` when no API token is configured; every authenticated route then fails closed
    pub api_token: Option<TokenVerifier>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AllocationStore>,
        policy: DeadlinePolicy,
        sweep_timeout: Duration,
        api_token: Option<&str>,
    ) -> Self {
        Self {
            settings: SettingsService::new(store.clone()),
            store,
            policy,
            sweep_timeout,
            api_token: api_token.map(TokenVerifier::new),
        }
    }

    pub fn from_config(store: Arc<dyn AllocationStore>, config: &Config) -> Self {
        Self::new(
            store,
            DeadlinePolicy {
                grace_applied_at_creation: config.sweep.grace_applied_at_creation,
            },
            config.sweep.request_timeout,
            config.security.payment_check_token.as_deref(),
        )
    }

    pub fn store(&self) -> &dyn AllocationStore {
        self.store.as_ref()
    }
}
