//! Common test utilities and helpers
//!
//! This module provides shared functionality for all tests.

pub mod fixtures;

pub use db::TestDb;
pub use fixtures::{
    claim, seed_hostel, test_app_state, InstrumentedStore, HostelBuilder, TEST_TOKEN,
};
