//! Registry E2E test suite.
//!
//! Drives the lifecycle engine and the HTTP surface against an in-memory
//! SQLite database and a temporary storage directory.
//!
//! Run with: cargo test --test registry_e2e

mod test_helpers;

mod test_admin;
