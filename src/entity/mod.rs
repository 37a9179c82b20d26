//! SeaORM entity definitions for PostgreSQL database.

pub mod application;
pub mod application_file;
