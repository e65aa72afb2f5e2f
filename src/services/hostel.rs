use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateHostel, Hostel, ReserveRoom, Room};
use crate::services::SettingsService;
use crate::store::AllocationStore;

pub struct HostelService;

impl HostelService {
    /// Seeds a hostel with its floors and rooms
    pub async fn create(
        store: &dyn AllocationStore,
        settings: &SettingsService,
        input: CreateHostel,
    ) -> AppResult<Hostel> {
        let settings = settings.get().await?;
        let hostel = input.build(settings.max_room_capacity)?;
        store.insert_hostel(&hostel).await?;

        log::info!(
            "Created hostel {} ({}) with {} rooms",
            hostel.name,
            hostel.id,
            hostel.rooms().count()
        );

        Ok(hostel)
    }

    pub async fn get_room(store: &dyn AllocationStore, room_id: Uuid) -> AppResult<Room> {
        store
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))
    }

    /// Holds a room for `input.days` days from `now`
    pub async fn reserve_room(
        store: &dyn AllocationStore,
        room_id: Uuid,
        input: ReserveRoom,
        now: DateTime<Utc>,
    ) -> AppResult<Room> {
        let reserved_by = input.reserved_by.trim();
        if reserved_by.is_empty() {
            return Err(AppError::Validation("reservedBy is required".to_string()));
        }
        if !(1..=365).contains(&input.days) {
            return Err(AppError::Validation(
                "days must be between 1 and 365".to_string(),
            ));
        }

        let room = store
            .reserve_room(room_id, reserved_by, now + Duration::days(input.days))
            .await?;
        log::info!("Room {} reserved by {}", room.number, reserved_by);
        Ok(room)
    }

    pub async fn unreserve_room(store: &dyn AllocationStore, room_id: Uuid) -> AppResult<Room> {
        let room = store.unreserve_room(room_id).await?;
        log::info!(
            "Room {} unreserved (available: {})",
            room.number,
            room.is_available
        );
        Ok(room)
    }
}
