pub mod allocations;
pub mod deadlines;
pub mod health;
pub mod hostels;
pub mod settings;

use actix_web::web;

/// Registers every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .configure(deadlines::configure)
        .configure(settings::configure)
        .configure(allocations::configure)
        .configure(hostels::configure);
}
