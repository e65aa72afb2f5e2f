pub mod allocation;
pub mod hostel;
pub mod settings;
pub mod sweep;

pub use allocation::AllocationService;
pub use hostel::HostelService;
pub use settings::SettingsService;
pub use sweep::{
    select_expired, DeadlinePolicy, DeadlineStatus, ExpiredAllocation, OverdueSummary,
    RevocationResult, SweepService, SweepSummary,
};
