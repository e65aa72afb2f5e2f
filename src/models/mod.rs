pub mod allocation;
pub mod hostel;
pub mod settings;

pub use allocation::{
    CreateAllocation, NewAllocation, PaymentStatus, RevokeOutcome, RoomAllocation,
    UpdatePaymentStatus,
};
pub use hostel::{
    CreateFloor, CreateHostel, CreateRoom, Floor, Gender, Hostel, ReserveRoom, Room,
};
pub use settings::{HostelSettings, UpdateSettings};
