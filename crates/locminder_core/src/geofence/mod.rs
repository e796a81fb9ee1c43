//! Geofence registration and transition handling.
//!
//! # Responsibility
//! - Negotiate location permission and device settings before registering.
//! - Build and submit monitored regions for activatable reminders.
//! - Resolve platform transition events back to reminders.
//!
//! # Invariants
//! - At most one registration per reminder id (the id is the request id).
//! - Only ENTER transitions are requested and acted upon.
//! - Platform interaction goes through the async traits in `platform`.

pub mod cancel;
pub mod event;
pub mod platform;
pub mod registrar;
pub mod registration;
