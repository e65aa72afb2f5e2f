//! Roomwarden server library
//!
//! Payment-deadline enforcement for student room allocations. Exposed as a
//! library so the integration tests can assemble the app.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod store;
