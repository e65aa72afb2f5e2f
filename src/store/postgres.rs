use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    Hostel, HostelSettings, NewAllocation, PaymentStatus, RevokeOutcome, Room, RoomAllocation,
};

use super::AllocationStore;

const ALLOCATION_COLUMNS: &str = "id, student_reg_number, room_id, hostel_id, allocated_at, \
     payment_status, payment_deadline, semester, academic_year, payment_id";

const ROOM_COLUMNS: &str = "id, hostel_id, floor_id, number, capacity, occupants, \
     is_available, is_reserved, reserved_by, reserved_until, gender, price";

/// PostgreSQL-backed allocation store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens the pool and brings the schema up to date.
    ///
    /// Every session runs in UTC so deadline comparisons never depend on the
    /// server's zone.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        log::info!("Connecting to allocation database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("SET timezone = 'UTC'").execute(conn).await?;
                    Ok(())
                })
            })
            .connect(&config.url)
            .await?;

        log::info!(
            "Allocation database pool ready (max: {}, min: {})",
            config.max_connections,
            config.min_connections
        );

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration error: {}", e)))?;
        log::info!("Allocation schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl AllocationStore for PgStore {
    async fn get_settings(&self) -> AppResult<Option<HostelSettings>> {
        let settings = sqlx::query_as::<_, HostelSettings>(
            r#"
            SELECT payment_grace_period, auto_revoke_unpaid_allocations,
                   max_room_capacity, allow_mixed_gender
            FROM hostel_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn save_settings(&self, settings: &HostelSettings) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hostel_settings (
                id, payment_grace_period, auto_revoke_unpaid_allocations,
                max_room_capacity, allow_mixed_gender
            )
            VALUES (1, $1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET payment_grace_period = EXCLUDED.payment_grace_period,
                auto_revoke_unpaid_allocations = EXCLUDED.auto_revoke_unpaid_allocations,
                max_room_capacity = EXCLUDED.max_room_capacity,
                allow_mixed_gender = EXCLUDED.allow_mixed_gender,
                updated_at = NOW()
            "#,
        )
        .bind(settings.payment_grace_period)
        .bind(settings.auto_revoke_unpaid_allocations)
        .bind(settings.max_room_capacity)
        .bind(settings.allow_mixed_gender)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_allocations_by_status(
        &self,
        statuses: &[PaymentStatus],
    ) -> AppResult<Vec<RoomAllocation>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let allocations = sqlx::query_as::<_, RoomAllocation>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM room_allocations \
             WHERE payment_status = ANY($1) \
             ORDER BY payment_deadline ASC, id ASC"
        ))
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;

        Ok(allocations)
    }

    async fn get_allocation(&self, id: Uuid) -> AppResult<Option<RoomAllocation>> {
        let allocation = sqlx::query_as::<_, RoomAllocation>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM room_allocations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(allocation)
    }

    async fn revoke_allocation(&self, id: Uuid) -> AppResult<RevokeOutcome> {
        let mut tx = self.pool.begin().await?;

        // DELETE ... RETURNING takes the row lock, so a concurrent sweep
        // revoking the same allocation sees nothing and becomes a no-op.
        let deleted: Option<RoomAllocation> = sqlx::query_as(&format!(
            "DELETE FROM room_allocations WHERE id = $1 RETURNING {ALLOCATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(allocation) = deleted else {
            tx.rollback().await?;
            return Ok(RevokeOutcome::AlreadyRevoked);
        };

        sqlx::query(
            r#"
            UPDATE rooms
            SET occupants = array_remove(occupants, $2),
                is_available = NOT is_reserved
            WHERE id = $1
            "#,
        )
        .bind(allocation.room_id)
        .bind(&allocation.student_reg_number)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RevokeOutcome::Revoked)
    }

    async fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        payment_id: Option<Uuid>,
    ) -> AppResult<RoomAllocation> {
        let mut tx = self.pool.begin().await?;

        let current: Option<PaymentStatus> = sqlx::query_scalar(
            "SELECT payment_status FROM room_allocations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current
            .ok_or_else(|| AppError::NotFound(format!("Allocation {} not found", id)))?;

        if !current.can_transition_to(status) {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Allocation {} cannot move from {} to {}",
                id, current, status
            )));
        }

        let allocation: RoomAllocation = sqlx::query_as(&format!(
            "UPDATE room_allocations \
             SET payment_status = $2, payment_id = COALESCE($3, payment_id) \
             WHERE id = $1 \
             RETURNING {ALLOCATION_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(payment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(allocation)
    }

    async fn claim_room(&self, allocation: NewAllocation) -> AppResult<RoomAllocation> {
        let mut tx = self.pool.begin().await?;

        let already_allocated: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM room_allocations WHERE student_reg_number = $1)",
        )
        .bind(&allocation.student_reg_number)
        .fetch_one(&mut *tx)
        .await?;

        if already_allocated {
            tx.rollback().await?;
            return Err(already_allocated_error(&allocation.student_reg_number));
        }

        // Conditional update on the room row: only one of two racing
        // claims for the last slot can match the WHERE clause.
        let claimed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE rooms
            SET occupants = array_append(occupants, $2),
                is_available = cardinality(occupants) + 1 < capacity
            WHERE id = $1
              AND hostel_id = $3
              AND is_available
              AND NOT is_reserved
              AND cardinality(occupants) < capacity
              AND NOT ($2 = ANY(occupants))
            RETURNING id
            "#,
        )
        .bind(allocation.room_id)
        .bind(&allocation.student_reg_number)
        .bind(allocation.hostel_id)
        .fetch_optional(&mut *tx)
        .await?;

        if claimed.is_none() {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM rooms WHERE id = $1 AND hostel_id = $2)",
            )
            .bind(allocation.room_id)
            .bind(allocation.hostel_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Err(if exists {
                AppError::Conflict(format!("Room {} is no longer available", allocation.room_id))
            } else {
                AppError::NotFound(format!(
                    "Room {} not found in hostel {}",
                    allocation.room_id, allocation.hostel_id
                ))
            });
        }

        let created: RoomAllocation = sqlx::query_as(&format!(
            "INSERT INTO room_allocations ( \
                 id, student_reg_number, room_id, hostel_id, allocated_at, \
                 payment_status, payment_deadline, semester, academic_year \
             ) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ALLOCATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&allocation.student_reg_number)
        .bind(allocation.room_id)
        .bind(allocation.hostel_id)
        .bind(allocation.allocated_at)
        .bind(PaymentStatus::Pending.as_str())
        .bind(allocation.payment_deadline)
        .bind(&allocation.semester)
        .bind(&allocation.academic_year)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            // A concurrent claim by the same student committed first
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                already_allocated_error(&allocation.student_reg_number)
            }
            e => AppError::Database(e),
        })?;

        tx.commit().await?;

        Ok(created)
    }

    async fn insert_hostel(&self, hostel: &Hostel) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO hostels (id, name, gender, price_per_semester, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(hostel.id)
        .bind(&hostel.name)
        .bind(hostel.gender)
        .bind(hostel.price_per_semester)
        .bind(hostel.is_active)
        .execute(&mut *tx)
        .await?;

        for (position, floor) in hostel.floors.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO floors (id, hostel_id, number, name, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(floor.id)
            .bind(hostel.id)
            .bind(&floor.number)
            .bind(&floor.name)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;

            for room in &floor.rooms {
                sqlx::query(
                    r#"
                    INSERT INTO rooms (
                        id, hostel_id, floor_id, number, capacity, occupants,
                        is_available, is_reserved, reserved_by, reserved_until,
                        gender, price
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    "#,
                )
                .bind(room.id)
                .bind(hostel.id)
                .bind(floor.id)
                .bind(&room.number)
                .bind(room.capacity)
                .bind(&room.occupants)
                .bind(room.is_available)
                .bind(room.is_reserved)
                .bind(&room.reserved_by)
                .bind(room.reserved_until)
                .bind(room.gender)
                .bind(room.price)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }

    async fn get_room(&self, room_id: Uuid) -> AppResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"
        ))
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    async fn reserve_room(
        &self,
        room_id: Uuid,
        reserved_by: &str,
        reserved_until: DateTime<Utc>,
    ) -> AppResult<Room> {
        let room: Option<Room> = sqlx::query_as(&format!(
            "UPDATE rooms \
             SET is_reserved = TRUE, reserved_by = $2, reserved_until = $3, is_available = FALSE \
             WHERE id = $1 \
             RETURNING {ROOM_COLUMNS}"
        ))
        .bind(room_id)
        .bind(reserved_by)
        .bind(reserved_until)
        .fetch_optional(&self.pool)
        .await?;

        room.ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))
    }

    async fn unreserve_room(&self, room_id: Uuid) -> AppResult<Room> {
        // Availability is recomputed from the row itself, in the same statement
        let room: Option<Room> = sqlx::query_as(&format!(
            "UPDATE rooms \
             SET is_reserved = FALSE, reserved_by = NULL, reserved_until = NULL, \
                 is_available = cardinality(occupants) < capacity \
             WHERE id = $1 \
             RETURNING {ROOM_COLUMNS}"
        ))
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        room.ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

fn already_allocated_error(student_reg_number: &str) -> AppError {
    AppError::Conflict(format!(
        "Student {} already has a room allocation",
        student_reg_number
    ))
}
