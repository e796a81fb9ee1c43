//! Core of the location reminders app.
//! This crate is the single source of truth for reminder persistence,
//! validation, geofence negotiation and transition handling.

pub mod config;
pub mod db;
pub mod geofence;
pub mod logging;
pub mod model;
pub mod presenter;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, GeofenceConfig, ACTION_GEOFENCE_EVENT};
pub use geofence::cancel::{CancelScope, CancelToken, Cancelled};
pub use geofence::event::{
    EventReport, GeofenceEvent, GeofenceEventHandler, IgnoredReason, ReminderNotification,
    ReminderNotifier,
};
pub use geofence::platform::{
    GeofencingClient, LocationPermissions, LocationPlatform, LocationPriority, LocationSettings,
    PermissionStatus, PlatformError, SettingsState,
};
pub use geofence::registrar::{Activation, ActivationOutcome, GeofenceRegistrar, RegistrarState};
pub use geofence::registration::{
    CallbackTarget, GeofenceRegistration, GeofencingRequest, RestoreSummary, TransitionMask,
    GEOFENCE_TRANSITION_DWELL, GEOFENCE_TRANSITION_ENTER, GEOFENCE_TRANSITION_EXIT,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::outcome::{Outcome, REMINDER_NOT_FOUND};
pub use model::reminder::{Reminder, ReminderId};
pub use repo::reminder_repo::ReminderRepository;
pub use service::validator::{validate, ValidationFailure};
pub use store::{MemoryReminderStore, ReminderStore, SqliteReminderStore, StoreError, StoreResult};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
