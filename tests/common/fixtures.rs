//! Test fixtures and data builders
//!
//! Provides hostels, allocations and a store wrapper that counts writes and
//! can be told to fail specific revocations.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use roomwarden::error::{AppError, AppResult};
use roomwarden::models::{
    CreateFloor, CreateHostel, CreateRoom, Gender, Hostel, HostelSettings, NewAllocation,
    PaymentStatus, RevokeOutcome, Room, RoomAllocation,
};
use roomwarden::services::DeadlinePolicy;
use roomwarden::state::AppState;
use roomwarden::store::{AllocationStore, MemoryStore};

pub const TEST_TOKEN: &str = "0123456789abcdef0123456789abcdef01234567";

/// App state with the test token, the default deadline policy and a short timeout
pub fn test_app_state(store: Arc<dyn AllocationStore>) -> web::Data<AppState> {
    web::Data::new(AppState::new(
        store,
        DeadlinePolicy::default(),
        Duration::from_secs(5),
        Some(TEST_TOKEN),
    ))
}

/// Builds hostel seed data with sensible defaults
pub struct HostelBuilder {
    name: String,
    gender: Gender,
    price: f64,
    capacities: Vec<i32>,
}

impl Default for HostelBuilder {
    fn default() -> Self {
        Self {
            name: "Block A".to_string(),
            gender: Gender::Mixed,
            price: 450.0,
            capacities: vec![2],
        }
    }
}

impl HostelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// One room per entry, all on the ground floor
    pub fn rooms(mut self, capacities: &[i32]) -> Self {
        self.capacities = capacities.to_vec();
        self
    }

    pub fn build(self) -> CreateHostel {
        CreateHostel {
            name: self.name,
            gender: self.gender,
            price_per_semester: self.price,
            is_active: true,
            floors: vec![CreateFloor {
                number: "0".to_string(),
                name: "Ground Floor".to_string(),
                rooms: self
                    .capacities
                    .iter()
                    .enumerate()
                    .map(|(i, capacity)| CreateRoom {
                        number: format!("G{:02}", i + 1),
                        capacity: *capacity,
                        gender: None,
                        price: None,
                    })
                    .collect(),
            }],
        }
    }
}

/// Inserts a hostel with one room per capacity and returns it
pub async fn seed_hostel(store: &dyn AllocationStore, capacities: &[i32]) -> Hostel {
    let hostel = HostelBuilder::new()
        .rooms(capacities)
        .build()
        .build(HostelSettings::default().max_room_capacity)
        .expect("Invalid hostel fixture");
    store
        .insert_hostel(&hostel)
        .await
        .expect("Failed to insert hostel");
    hostel
}

/// Claims `room` for `student` with an explicit deadline, then moves it to `status`
pub async fn claim(
    store: &dyn AllocationStore,
    room: &Room,
    student: &str,
    deadline: DateTime<Utc>,
    status: PaymentStatus,
) -> RoomAllocation {
    let allocation = store
        .claim_room(NewAllocation {
            student_reg_number: student.to_string(),
            room_id: room.id,
            hostel_id: room.hostel_id,
            allocated_at: deadline - chrono::Duration::hours(48),
            payment_deadline: deadline,
            semester: "Semester 1".to_string(),
            academic_year: "2026/2027".to_string(),
        })
        .await
        .expect("Failed to claim room");

    if status == PaymentStatus::Pending {
        return allocation;
    }

    store
        .set_payment_status(allocation.id, status, None)
        .await
        .expect("Failed to set payment status")
}

/// Wraps a [`MemoryStore`], counts writes and fails chosen revocations
#[derive(Default)]
pub struct InstrumentedStore {
    pub inner: MemoryStore,
    fail_revoke: Mutex<HashSet<Uuid>>,
    listing_delay: Mutex<Option<Duration>>,
    settings_read_delay: Mutex<Option<Duration>>,
    unhealthy: AtomicBool,
    writes: AtomicUsize,
    revoke_calls: AtomicUsize,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_revoke_for(&self, id: Uuid) {
        self.fail_revoke.lock().unwrap().insert(id);
    }

    /// Makes every listing sleep first, to trip request timeouts
    pub fn delay_listing(&self, delay: Duration) {
        *self.listing_delay.lock().unwrap() = Some(delay);
    }

    /// Settings reads take their snapshot, then sleep before returning it
    pub fn delay_settings_read(&self, delay: Duration) {
        *self.settings_read_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_unhealthy(&self) {
        self.unhealthy.store(true, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.writes.store(0, Ordering::SeqCst);
        self.revoke_calls.store(0, Ordering::SeqCst);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AllocationStore for InstrumentedStore {
    async fn get_settings(&self) -> AppResult<Option<HostelSettings>> {
        let snapshot = self.inner.get_settings().await;
        let delay = *self.settings_read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        snapshot
    }

    async fn save_settings(&self, settings: &HostelSettings) -> AppResult<()> {
        self.record_write();
        self.inner.save_settings(settings).await
    }

    async fn list_allocations_by_status(
        &self,
        statuses: &[PaymentStatus],
    ) -> AppResult<Vec<RoomAllocation>> {
        let delay = *self.listing_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.list_allocations_by_status(statuses).await
    }

    async fn get_allocation(&self, id: Uuid) -> AppResult<Option<RoomAllocation>> {
        self.inner.get_allocation(id).await
    }

    async fn revoke_allocation(&self, id: Uuid) -> AppResult<RevokeOutcome> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_revoke.lock().unwrap().contains(&id) {
            return Err(AppError::Storage(format!(
                "simulated write failure for {}",
                id
            )));
        }
        self.record_write();
        self.inner.revoke_allocation(id).await
    }

    async fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        payment_id: Option<Uuid>,
    ) -> AppResult<RoomAllocation> {
        self.record_write();
        self.inner.set_payment_status(id, status, payment_id).await
    }

    async fn claim_room(&self, allocation: NewAllocation) -> AppResult<RoomAllocation> {
        self.record_write();
        self.inner.claim_room(allocation).await
    }

    async fn insert_hostel(&self, hostel: &Hostel) -> AppResult<()> {
        self.record_write();
        self.inner.insert_hostel(hostel).await
    }

    async fn get_room(&self, room_id: Uuid) -> AppResult<Option<Room>> {
        self.inner.get_room(room_id).await
    }

    async fn reserve_room(
        &self,
        room_id: Uuid,
        reserved_by: &str,
        reserved_until: DateTime<Utc>,
    ) -> AppResult<Room> {
        self.record_write();
        self.inner
            .reserve_room(room_id, reserved_by, reserved_until)
            .await
    }

    async fn unreserve_room(&self, room_id: Uuid) -> AppResult<Room> {
        self.record_write();
        self.inner.unreserve_room(room_id).await
    }

    async fn health_check(&self) -> bool {
        !self.unhealthy.load(Ordering::SeqCst)
    }
}
