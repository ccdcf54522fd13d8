//! services/api/src/lib.rs
//!
//! The HTTP service around `daily_reading_core`: configuration, adapters for
//! PostgreSQL, password hashing and push delivery, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
