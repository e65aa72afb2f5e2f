use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment status of a room allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl PaymentStatus {
    /// Statuses the revocation sweep considers
    pub const UNPAID: [PaymentStatus; 2] = [PaymentStatus::Pending, PaymentStatus::Overdue];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Overdue => "Overdue",
        }
    }

    pub fn is_unpaid(&self) -> bool {
        !matches!(self, PaymentStatus::Paid)
    }

    /// Whether the payment state machine allows moving from `self` to `next`
    ///
    /// `Paid` is terminal and nothing returns to `Pending`.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match (self, next) {
            (a, b) if *a == b => true,
            (PaymentStatus::Pending, PaymentStatus::Paid)
            | (PaymentStatus::Pending, PaymentStatus::Overdue)
            | (PaymentStatus::Overdue, PaymentStatus::Paid) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's claim on a room for a semester
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoomAllocation {
    pub id: Uuid,
    pub student_reg_number: String,
    pub room_id: Uuid,
    pub hostel_id: Uuid,
    pub allocated_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub payment_deadline: DateTime<Utc>,
    pub semester: String,
    pub academic_year: String,
    pub payment_id: Option<Uuid>,
}

/// A fully built allocation waiting for its room claim
#[derive(Debug, Clone)]
pub struct NewAllocation {
    pub student_reg_number: String,
    pub room_id: Uuid,
    pub hostel_id: Uuid,
    pub allocated_at: DateTime<Utc>,
    pub payment_deadline: DateTime<Utc>,
    pub semester: String,
    pub academic_year: String,
}

impl NewAllocation {
    pub fn into_allocation(self, id: Uuid) -> RoomAllocation {
        RoomAllocation {
            id,
            student_reg_number: self.student_reg_number,
            room_id: self.room_id,
            hostel_id: self.hostel_id,
            allocated_at: self.allocated_at,
            payment_status: PaymentStatus::Pending,
            payment_deadline: self.payment_deadline,
            semester: self.semester,
            academic_year: self.academic_year,
            payment_id: None,
        }
    }
}

/// DTO for claiming a room
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllocation {
    pub student_reg_number: String,
    pub room_id: Uuid,
    pub hostel_id: Uuid,
}

/// DTO for moving an allocation along the payment state machine
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatus {
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_id: Option<Uuid>,
}

/// What happened to an allocation handed to the store for revocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// Record removed and room released
    Revoked,
    /// Nothing left to revoke
    AlreadyRevoked,
}
