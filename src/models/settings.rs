use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Singleton hostel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HostelSettings {
    /// Hours a student has to pay after claiming a room
    pub payment_grace_period: i32,
    pub auto_revoke_unpaid_allocations: bool,
    pub max_room_capacity: i32,
    pub allow_mixed_gender: bool,
}

impl Default for HostelSettings {
    fn default() -> Self {
        Self {
            payment_grace_period: 168,
            auto_revoke_unpaid_allocations: true,
            max_room_capacity: 4,
            allow_mixed_gender: false,
        }
    }
}

impl HostelSettings {
    /// Checks the values the sweep and room claims depend on
    pub fn validate(&self) -> AppResult<()> {
        if self.payment_grace_period < 0 {
            return Err(AppError::Validation(
                "paymentGracePeriod must not be negative".to_string(),
            ));
        }
        if self.max_room_capacity < 1 {
            return Err(AppError::Validation(
                "maxRoomCapacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.payment_grace_period))
    }
}

/// Request body for `PUT /api/settings`; omitted fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    pub payment_grace_period: Option<i32>,
    pub auto_revoke_unpaid_allocations: Option<bool>,
    pub max_room_capacity: Option<i32>,
    pub allow_mixed_gender: Option<bool>,
}

impl UpdateSettings {
    pub fn apply(self, current: HostelSettings) -> HostelSettings {
        HostelSettings {
            payment_grace_period: self
                .payment_grace_period
                .unwrap_or(current.payment_grace_period),
            auto_revoke_unpaid_allocations: self
                .auto_revoke_unpaid_allocations
                .unwrap_or(current.auto_revoke_unpaid_allocations),
            max_room_capacity: self.max_room_capacity.unwrap_or(current.max_room_capacity),
            allow_mixed_gender: self.allow_mixed_gender.unwrap_or(current.allow_mixed_gender),
        }
    }
}
