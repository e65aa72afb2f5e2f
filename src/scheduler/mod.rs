//! In-process fallback scheduler for the revocation sweep.
//!
//! Runs once shortly after startup, then daily at a fixed UTC hour. The
//! schedule lives only in this task: a restart starts it over and several
//! instances each run their own. Production deployments should drive
//! `POST /api/check-payment-deadlines` from an external cron instead.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use tokio::task::JoinHandle;

use crate::services::SweepService;
use crate::state::AppState;

/// The first moment strictly after `now` whose UTC hour is `hour`
pub fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();

    if now < today {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Spawns the scheduler loop on the current runtime
pub fn spawn(state: Arc<AppState>, run_hour_utc: u32, startup_delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::info!(
            "Payment deadline scheduler started (first run in {}s, then daily at {:02}:00 UTC)",
            startup_delay.as_secs(),
            run_hour_utc
        );

        tokio::time::sleep(startup_delay).await;
        run_once(&state).await;

        loop {
            let now = Utc::now();
            let next = next_run_after(now, run_hour_utc);
            log::info!("Next payment deadline check scheduled for {}", next);

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
            run_once(&state).await;
        }
    })
}

async fn run_once(state: &AppState) {
    log::info!("[Scheduler] Running payment deadline check...");

    match SweepService::run(state.store(), &state.settings, state.policy, Utc::now()).await {
        Ok(summary) => {
            log::info!(
                "[Scheduler] Payment check completed: {} expired, {} revoked, {} failed",
                summary.total_expired,
                summary.revoked_count,
                summary.failure_count
            );
            if summary.failure_count > 0 {
                for failed in summary.results.iter().filter(|r| !r.success) {
                    log::error!(
                        "[Scheduler] Allocation {} could not be revoked: {}",
                        failed.allocation_id,
                        failed.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }
        Err(e) => {
            log::error!("[Scheduler] Payment deadline check failed: {}", e);
        }
    }
}
