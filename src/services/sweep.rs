//! Payment-deadline revocation sweep.
//!
//! Finds unpaid allocations whose payment window has elapsed, revokes them
//! and frees their rooms. Every step reads the clock from the caller so the
//! same code serves the HTTP trigger, the scheduler and the tests.

use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{HostelSettings, PaymentStatus, RevokeOutcome, RoomAllocation};
use crate::services::SettingsService;
use crate::store::AllocationStore;

/// How the sweep turns a stored deadline into the moment an allocation expires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadlinePolicy {
    /// The stored deadline already includes the grace period.
    ///
    /// Room claims store `now + grace` as the deadline. With this off (the
    /// default) the sweep adds the grace period once more, so an allocation
    /// lives for twice the configured grace period.
    pub grace_applied_at_creation: bool,
}

impl DeadlinePolicy {
    pub fn effective_deadline(
        &self,
        payment_deadline: DateTime<Utc>,
        grace_period: Duration,
    ) -> DateTime<Utc> {
        if self.grace_applied_at_creation {
            payment_deadline
        } else {
            payment_deadline + grace_period
        }
    }

    /// Expired strictly after the effective deadline; `Paid` never expires
    pub fn is_expired(
        &self,
        allocation: &RoomAllocation,
        grace_period: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        allocation.payment_status.is_unpaid()
            && now > self.effective_deadline(allocation.payment_deadline, grace_period)
    }
}

/// Outcome of one revocation inside a sweep
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationResult {
    pub allocation_id: Uuid,
    pub student_reg_number: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report returned by a mutating sweep
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub message: String,
    pub total_expired: usize,
    pub revoked_count: usize,
    pub failure_count: usize,
    pub results: Vec<RevocationResult>,
}

impl SweepSummary {
    pub fn disabled() -> Self {
        Self {
            message: "Auto-revoke is disabled".to_string(),
            total_expired: 0,
            revoked_count: 0,
            failure_count: 0,
            results: Vec::new(),
        }
    }

    fn from_results(results: Vec<RevocationResult>) -> Self {
        let revoked_count = results.iter().filter(|r| r.success).count();
        Self {
            message: "Payment deadline check completed".to_string(),
            total_expired: results.len(),
            revoked_count,
            failure_count: results.len() - revoked_count,
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredAllocation {
    pub id: Uuid,
    pub student_reg_number: String,
    pub payment_deadline: DateTime<Utc>,
    /// Whole hours past the effective deadline
    pub hours_overdue: i64,
}

/// Read-only view of what a sweep would do right now
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineStatus {
    pub auto_revoke_enabled: bool,
    pub payment_grace_period: i32,
    pub total_unpaid_allocations: usize,
    pub expired_allocations: usize,
    pub expired_details: Vec<ExpiredAllocation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueSummary {
    pub checked_count: usize,
    pub overdue_count: usize,
    pub updated_count: usize,
}

/// Picks the allocations a sweep at `now` would revoke
pub fn select_expired<'a>(
    allocations: &'a [RoomAllocation],
    settings: &HostelSettings,
    policy: DeadlinePolicy,
    now: DateTime<Utc>,
) -> Vec<&'a RoomAllocation> {
    let grace = settings.grace_period();
    allocations
        .iter()
        .filter(|a| policy.is_expired(a, grace, now))
        .collect()
}

pub struct SweepService;

impl SweepService {
    /// Revokes every expired unpaid allocation.
    ///
    /// Failures of single revocations end up in the summary; only failing
    /// to read settings or list allocations is returned as an error.
    pub async fn run(
        store: &dyn AllocationStore,
        settings: &SettingsService,
        policy: DeadlinePolicy,
        now: DateTime<Utc>,
    ) -> AppResult<SweepSummary> {
        let settings = settings.get().await?;

        if !settings.auto_revoke_unpaid_allocations {
            log::info!("Payment deadline sweep skipped: auto-revoke is disabled");
            return Ok(SweepSummary::disabled());
        }

        let unpaid = store.list_unpaid_allocations().await?;
        let expired = select_expired(&unpaid, &settings, policy, now);

        log::info!(
            "Payment deadline sweep: {} unpaid, {} expired",
            unpaid.len(),
            expired.len()
        );

        // Each revocation touches its own allocation/room pair
        let results = join_all(expired.into_iter().map(|allocation| async move {
            match store.revoke_allocation(allocation.id).await {
                Ok(outcome) => {
                    if outcome == RevokeOutcome::AlreadyRevoked {
                        log::info!("Allocation {} was already revoked", allocation.id);
                    } else {
                        log::info!(
                            "Revoked allocation {} for student {}",
                            allocation.id,
                            allocation.student_reg_number
                        );
                    }
                    RevocationResult {
                        allocation_id: allocation.id,
                        student_reg_number: allocation.student_reg_number.clone(),
                        success: true,
                        error: None,
                    }
                }
                Err(e) => {
                    log::error!("Failed to revoke allocation {}: {}", allocation.id, e);
                    RevocationResult {
                        allocation_id: allocation.id,
                        student_reg_number: allocation.student_reg_number.clone(),
                        success: false,
                        error: Some(e.public_message()),
                    }
                }
            }
        }))
        .await;

        let summary = SweepSummary::from_results(results);
        if summary.revoked_count > 0 {
            log::warn!(
                "Payment deadline sweep revoked {} expired allocations",
                summary.revoked_count
            );
        }

        Ok(summary)
    }

    /// Same selection as [`SweepService::run`] without any writes
    pub async fn status(
        store: &dyn AllocationStore,
        settings: &SettingsService,
        policy: DeadlinePolicy,
        now: DateTime<Utc>,
    ) -> AppResult<DeadlineStatus> {
        let settings = settings.get().await?;
        let unpaid = store.list_unpaid_allocations().await?;
        let grace = settings.grace_period();

        let expired_details: Vec<ExpiredAllocation> =
            select_expired(&unpaid, &settings, policy, now)
                .into_iter()
                .map(|a| ExpiredAllocation {
                    id: a.id,
                    student_reg_number: a.student_reg_number.clone(),
                    payment_deadline: a.payment_deadline,
                    hours_overdue: (now - policy.effective_deadline(a.payment_deadline, grace))
                        .num_hours(),
                })
                .collect();

        Ok(DeadlineStatus {
            auto_revoke_enabled: settings.auto_revoke_unpaid_allocations,
            payment_grace_period: settings.payment_grace_period,
            total_unpaid_allocations: unpaid.len(),
            expired_allocations: expired_details.len(),
            expired_details,
        })
    }

    /// Moves `Pending` allocations past their stored deadline to `Overdue`.
    /// The grace period does not apply here.
    pub async fn mark_overdue(
        store: &dyn AllocationStore,
        now: DateTime<Utc>,
    ) -> AppResult<OverdueSummary> {
        let pending = store
            .list_allocations_by_status(&[PaymentStatus::Pending])
            .await?;

        let overdue: Vec<&RoomAllocation> = pending
            .iter()
            .filter(|a| now > a.payment_deadline)
            .collect();

        let updates = join_all(overdue.iter().map(|allocation| async move {
            store
                .set_payment_status(allocation.id, PaymentStatus::Overdue, None)
                .await
                .map_err(|e| {
                    log::error!(
                        "Failed to mark allocation {} as overdue: {}",
                        allocation.id,
                        e
                    );
                    e
                })
        }))
        .await;

        let updated_count = updates.iter().filter(|r| r.is_ok()).count();
        log::info!(
            "Marked {} of {} overdue allocations ({} pending checked)",
            updated_count,
            overdue.len(),
            pending.len()
        );

        Ok(OverdueSummary {
            checked_count: pending.len(),
            overdue_count: overdue.len(),
            updated_count,
        })
    }
}
