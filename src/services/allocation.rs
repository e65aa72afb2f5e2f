use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateAllocation, NewAllocation, PaymentStatus, RoomAllocation};
use crate::services::SettingsService;
use crate::store::AllocationStore;

pub struct AllocationService;

impl AllocationService {
    /// Claims a room slot for a student.
    ///
    /// The stored deadline is `now + grace period`; see
    /// [`crate::services::DeadlinePolicy`] for how the sweep reads it.
    pub async fn allocate(
        store: &dyn AllocationStore,
        settings: &SettingsService,
        input: CreateAllocation,
        now: DateTime<Utc>,
    ) -> AppResult<RoomAllocation> {
        let student_reg_number = input.student_reg_number.trim().to_string();
        if student_reg_number.is_empty() {
            return Err(AppError::Validation(
                "studentRegNumber is required".to_string(),
            ));
        }

        let settings = settings.get().await?;

        let allocation = store
            .claim_room(NewAllocation {
                student_reg_number,
                room_id: input.room_id,
                hostel_id: input.hostel_id,
                allocated_at: now,
                payment_deadline: now + settings.grace_period(),
                semester: current_semester(now),
                academic_year: current_academic_year(now),
            })
            .await?;

        log::info!(
            "Allocated room {} to student {} (payment due {})",
            allocation.room_id,
            allocation.student_reg_number,
            allocation.payment_deadline
        );

        Ok(allocation)
    }

    pub async fn get(store: &dyn AllocationStore, id: Uuid) -> AppResult<RoomAllocation> {
        store
            .get_allocation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Allocation {} not found", id)))
    }

    pub async fn update_payment_status(
        store: &dyn AllocationStore,
        id: Uuid,
        status: PaymentStatus,
        payment_id: Option<Uuid>,
    ) -> AppResult<RoomAllocation> {
        let allocation = store.set_payment_status(id, status, payment_id).await?;
        log::info!("Allocation {} payment status is now {}", id, status);
        Ok(allocation)
    }
}

/// Semester 1 runs August through January
pub fn current_semester(now: DateTime<Utc>) -> String {
    let month = now.month();
    if month >= 8 || month <= 1 {
        "Semester 1".to_string()
    } else {
        "Semester 2".to_string()
    }
}

/// Academic years start in August, e.g. `2026/2027`
pub fn current_academic_year(now: DateTime<Utc>) -> String {
    let year = now.year();
    if now.month() >= 8 {
        format!("{}/{}", year, year + 1)
    } else {
        format!("{}/{}", year - 1, year)
    }
}
