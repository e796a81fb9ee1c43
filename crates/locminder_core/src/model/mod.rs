//! Domain model for location reminders.
//!
//! # Responsibility
//! - Define the canonical reminder record shared by storage, validation,
//!   geofence registration and event handling.
//! - Define the uniform `Outcome` wrapper used at the repository boundary.
//!
//! # Invariants
//! - Every reminder is identified by a stable, generated `ReminderId`.
//! - Persisted reminders are replaced by id, never partially mutated.

pub mod outcome;
pub mod reminder;
