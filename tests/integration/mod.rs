//! Integration tests module
//!
//! HTTP tests run against the in-memory store; `pg_store_test` needs Docker
//! for a PostgreSQL container.

mod health_test;
mod settings_api_test;
