//! Repository layer between storage and the rest of the system.
//!
//! # Responsibility
//! - Expose async, use-case level reminder access to presenters, the
//!   geofence registrar and the geofence event handler.
//! - Translate every storage outcome into `Outcome`.
//!
//! # Invariants
//! - Raw `StoreError`s never cross the repository boundary.
//! - The repository holds no mutable state of its own.

pub mod reminder_repo;
