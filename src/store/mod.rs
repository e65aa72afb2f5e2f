//! Storage-agnostic access to settings, inventory and allocations.
//!
//! The sweep and the HTTP layer only ever see [`AllocationStore`]; one
//! adapter is picked at startup from `STORAGE_BACKEND`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Hostel, HostelSettings, NewAllocation, PaymentStatus, RevokeOutcome, Room, RoomAllocation,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait AllocationStore: Send + Sync {
    /// Reads the settings singleton, `None` when it was never written
    async fn get_settings(&self) -> AppResult<Option<HostelSettings>>;

    /// Creates or replaces the settings singleton
    async fn save_settings(&self, settings: &HostelSettings) -> AppResult<()>;

    /// Lists allocations whose payment status is one of `statuses`
    async fn list_allocations_by_status(
        &self,
        statuses: &[PaymentStatus],
    ) -> AppResult<Vec<RoomAllocation>>;

    /// Allocations the revocation sweep has to look at
    async fn list_unpaid_allocations(&self) -> AppResult<Vec<RoomAllocation>> {
        self.list_allocations_by_status(&PaymentStatus::UNPAID).await
    }

    async fn get_allocation(&self, id: Uuid) -> AppResult<Option<RoomAllocation>>;

    /// Deletes the allocation and releases its room as one operation.
    ///
    /// Must be safe to repeat: a missing allocation yields
    /// [`RevokeOutcome::AlreadyRevoked`] instead of an error.
    async fn revoke_allocation(&self, id: Uuid) -> AppResult<RevokeOutcome>;

    /// Moves an allocation along the payment state machine.
    /// Fails with `NotFound` or, for a forbidden transition, `Conflict`.
    async fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        payment_id: Option<Uuid>,
    ) -> AppResult<RoomAllocation>;

    /// Takes a slot in the room and records the allocation.
    ///
    /// The availability check and the occupant append happen atomically,
    /// so two students racing for the last slot cannot both win; the
    /// loser gets `Conflict`.
    async fn claim_room(&self, allocation: NewAllocation) -> AppResult<RoomAllocation>;

    async fn insert_hostel(&self, hostel: &Hostel) -> AppResult<()>;

    async fn get_room(&self, room_id: Uuid) -> AppResult<Option<Room>>;

    /// Holds a room back from claims until it is unreserved.
    /// Current occupants keep their places.
    async fn reserve_room(
        &self,
        room_id: Uuid,
        reserved_by: &str,
        reserved_until: DateTime<Utc>,
    ) -> AppResult<Room>;

    /// Lifts a hold; the room reopens only if it still has a free slot
    async fn unreserve_room(&self, room_id: Uuid) -> AppResult<Room>;

    async fn health_check(&self) -> bool;
}
