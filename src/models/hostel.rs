use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Gender restriction of a hostel or room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum Gender {
    Male,
    Female,
    Mixed,
}

/// A room inside a hostel floor
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub hostel_id: Uuid,
    pub floor_id: Uuid,
    pub number: String,
    pub capacity: i32,
    /// Registration numbers of the students holding the room
    pub occupants: Vec<String>,
    pub is_available: bool,
    /// Held back by an administrator; no claims while set
    pub is_reserved: bool,
    pub reserved_by: Option<String>,
    pub reserved_until: Option<DateTime<Utc>>,
    pub gender: Gender,
    /// Price per semester
    pub price: f64,
}

impl Room {
    pub fn is_full(&self) -> bool {
        self.occupants.len() as i64 >= i64::from(self.capacity)
    }

    /// Whether a new student could claim a slot right now
    pub fn can_accept(&self, student_reg_number: &str) -> bool {
        self.is_available
            && !self.is_reserved
            && !self.is_full()
            && !self.occupants.iter().any(|o| o == student_reg_number)
    }

    /// Drops a student from the room; a reserved room stays closed
    pub fn release(&mut self, student_reg_number: &str) {
        self.occupants.retain(|o| o != student_reg_number);
        self.is_available = !self.is_reserved;
    }

    pub fn reserve(&mut self, reserved_by: &str, reserved_until: DateTime<Utc>) {
        self.is_reserved = true;
        self.reserved_by = Some(reserved_by.to_string());
        self.reserved_until = Some(reserved_until);
        self.is_available = false;
    }

    /// Lifts a reservation; the room reopens only if it has a free slot
    pub fn unreserve(&mut self) {
        self.is_reserved = false;
        self.reserved_by = None;
        self.reserved_until = None;
        self.is_available = !self.is_full();
    }
}

/// Body of `POST /api/rooms/{id}/reserve`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRoom {
    pub reserved_by: String,
    #[serde(default = "default_reservation_days")]
    pub days: i64,
}

fn default_reservation_days() -> i64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: Uuid,
    pub number: String,
    pub name: String,
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hostel {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub price_per_semester: f64,
    pub is_active: bool,
    pub floors: Vec<Floor>,
}

impl Hostel {
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.floors.iter().flat_map(|f| f.rooms.iter())
    }

    pub fn room_mut(&mut self, room_id: Uuid) -> Option<&mut Room> {
        self.floors
            .iter_mut()
            .flat_map(|f| f.rooms.iter_mut())
            .find(|r| r.id == room_id)
    }
}

/// DTO for seeding a hostel with its floors and rooms
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHostel {
    pub name: String,
    pub gender: Gender,
    pub price_per_semester: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub floors: Vec<CreateFloor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFloor {
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub rooms: Vec<CreateRoom>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    pub number: String,
    pub capacity: i32,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub price: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl CreateHostel {
    /// Assigns ids and fills room defaults from the hostel
    pub fn build(self, max_room_capacity: i32) -> AppResult<Hostel> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Hostel name is required".to_string()));
        }

        let hostel_id = Uuid::new_v4();
        let mut floors = Vec::with_capacity(self.floors.len());

        for floor in self.floors {
            let floor_id = Uuid::new_v4();
            let mut rooms = Vec::with_capacity(floor.rooms.len());

            for room in floor.rooms {
                if room.capacity < 1 || room.capacity > max_room_capacity {
                    return Err(AppError::Validation(format!(
                        "Room {} capacity must be between 1 and {}",
                        room.number, max_room_capacity
                    )));
                }
                rooms.push(Room {
                    id: Uuid::new_v4(),
                    hostel_id,
                    floor_id,
                    number: room.number,
                    capacity: room.capacity,
                    occupants: Vec::new(),
                    is_available: true,
                    is_reserved: false,
                    reserved_by: None,
                    reserved_until: None,
                    gender: room.gender.unwrap_or(self.gender),
                    price: room.price.unwrap_or(self.price_per_semester),
                });
            }

            floors.push(Floor {
                id: floor_id,
                number: floor.number,
                name: floor.name,
                rooms,
            });
        }

        Ok(Hostel {
            id: hostel_id,
            name: self.name,
            gender: self.gender,
            price_per_semester: self.price_per_semester,
            is_active: self.is_active,
            floors,
        })
    }
}
