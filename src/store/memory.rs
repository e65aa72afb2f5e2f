use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Hostel, HostelSettings, NewAllocation, PaymentStatus, RevokeOutcome, Room, RoomAllocation,
};

use super::AllocationStore;

#[derive(Default)]
struct Inner {
    settings: Option<HostelSettings>,
    hostels: HashMap<Uuid, Hostel>,
    allocations: HashMap<Uuid, RoomAllocation>,
}

impl Inner {
    fn room_mut(&mut self, room_id: Uuid) -> Option<&mut Room> {
        self.hostels
            .values_mut()
            .find_map(|h| h.room_mut(room_id))
    }
}

/// Process-local store for development and tests.
///
/// Every mutation takes the single write lock, which gives the same
/// atomicity the PostgreSQL adapter gets from its transactions.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn allocation_count(&self) -> usize {
        self.inner.read().await.allocations.len()
    }
}

#[async_trait]
impl AllocationStore for MemoryStore {
    async fn get_settings(&self) -> AppResult<Option<HostelSettings>> {
        Ok(self.inner.read().await.settings.clone())
    }

    async fn save_settings(&self, settings: &HostelSettings) -> AppResult<()> {
        self.inner.write().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn list_allocations_by_status(
        &self,
        statuses: &[PaymentStatus],
    ) -> AppResult<Vec<RoomAllocation>> {
        let inner = self.inner.read().await;
        let mut allocations: Vec<RoomAllocation> = inner
            .allocations
            .values()
            .filter(|a| statuses.contains(&a.payment_status))
            .cloned()
            .collect();
        allocations.sort_by(|a, b| {
            a.payment_deadline
                .cmp(&b.payment_deadline)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(allocations)
    }

    async fn get_allocation(&self, id: Uuid) -> AppResult<Option<RoomAllocation>> {
        Ok(self.inner.read().await.allocations.get(&id).cloned())
    }

    async fn revoke_allocation(&self, id: Uuid) -> AppResult<RevokeOutcome> {
        let mut inner = self.inner.write().await;

        let Some(allocation) = inner.allocations.remove(&id) else {
            return Ok(RevokeOutcome::AlreadyRevoked);
        };

        if let Some(room) = inner
            .hostels
            .get_mut(&allocation.hostel_id)
            .and_then(|h| h.room_mut(allocation.room_id))
        {
            room.release(&allocation.student_reg_number);
        }

        Ok(RevokeOutcome::Revoked)
    }

    async fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        payment_id: Option<Uuid>,
    ) -> AppResult<RoomAllocation> {
        let mut inner = self.inner.write().await;

        let allocation = inner
            .allocations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Allocation {} not found", id)))?;

        if !allocation.payment_status.can_transition_to(status) {
            return Err(AppError::Conflict(format!(
                "Allocation {} cannot move from {} to {}",
                id, allocation.payment_status, status
            )));
        }

        allocation.payment_status = status;
        if payment_id.is_some() {
            allocation.payment_id = payment_id;
        }

        Ok(allocation.clone())
    }

    async fn claim_room(&self, allocation: NewAllocation) -> AppResult<RoomAllocation> {
        let mut inner = self.inner.write().await;

        if inner
            .allocations
            .values()
            .any(|a| a.student_reg_number == allocation.student_reg_number)
        {
            return Err(AppError::Conflict(format!(
                "Student {} already has a room allocation",
                allocation.student_reg_number
            )));
        }

        let room = inner
            .hostels
            .get_mut(&allocation.hostel_id)
            .and_then(|h| h.room_mut(allocation.room_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Room {} not found in hostel {}",
                    allocation.room_id, allocation.hostel_id
                ))
            })?;

        if !room.can_accept(&allocation.student_reg_number) {
            return Err(AppError::Conflict(format!(
                "Room {} is no longer available",
                allocation.room_id
            )));
        }

        room.occupants.push(allocation.student_reg_number.clone());
        if room.is_full() {
            room.is_available = false;
        }

        let created = allocation.into_allocation(Uuid::new_v4());
        inner.allocations.insert(created.id, created.clone());

        Ok(created)
    }

    async fn insert_hostel(&self, hostel: &Hostel) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if inner.hostels.contains_key(&hostel.id) {
            return Err(AppError::Conflict(format!(
                "Hostel {} already exists",
                hostel.id
            )));
        }
        inner.hostels.insert(hostel.id, hostel.clone());
        Ok(())
    }

    async fn get_room(&self, room_id: Uuid) -> AppResult<Option<Room>> {
        let inner = self.inner.read().await;
        let room = inner
            .hostels
            .values()
            .flat_map(|h| h.rooms())
            .find(|r| r.id == room_id)
            .cloned();
        Ok(room)
    }

    async fn reserve_room(
        &self,
        room_id: Uuid,
        reserved_by: &str,
        reserved_until: DateTime<Utc>,
    ) -> AppResult<Room> {
        let mut inner = self.inner.write().await;
        let room = inner
            .room_mut(room_id)
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))?;

        room.reserve(reserved_by, reserved_until);
        Ok(room.clone())
    }

    async fn unreserve_room(&self, room_id: Uuid) -> AppResult<Room> {
        let mut inner = self.inner.write().await;
        let room = inner
            .room_mut(room_id)
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))?;

        room.unreserve();
        Ok(room.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
