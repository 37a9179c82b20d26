//! Horse Registry Server library.
//!
//! Record management for horse-breeding applications: metadata, attached
//! documents, and the draft/sent/complete workflow they move through.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
