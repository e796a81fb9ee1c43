//! Geofence registration values submitted to the platform.
//!
//! Registrations are derived from reminders and never persisted; they can be
//! rebuilt from stored reminders at any time, and re-submitting the same id
//! replaces the previous registration.

use crate::config::GeofenceConfig;
use crate::model::reminder::{Reminder, ReminderId};
use crate::service::validator::ensure_activatable;
use serde::Serialize;

/// Transition code for entering a region.
pub const GEOFENCE_TRANSITION_ENTER: i32 = 1;
/// Transition code for leaving a region.
pub const GEOFENCE_TRANSITION_EXIT: i32 = 2;
/// Transition code for staying inside a region for the loiter delay.
pub const GEOFENCE_TRANSITION_DWELL: i32 = 4;

/// Bit mask of requested transition types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TransitionMask(i32);

impl TransitionMask {
    pub const ENTER: Self = Self(GEOFENCE_TRANSITION_ENTER);

    pub fn bits(self) -> i32 {
        self.0
    }

    pub fn contains(self, transition_type: i32) -> bool {
        transition_type != 0 && self.0 & transition_type == transition_type
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    Never,
}

/// Trigger applied when the device is already inside a newly added region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialTrigger {
    Enter,
}

/// One monitored circular region, keyed by reminder id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofenceRegistration {
    pub request_id: ReminderId,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f32,
    pub loiter_delay_ms: u32,
    pub expiration: Expiration,
    pub transitions: TransitionMask,
}

impl GeofenceRegistration {
    /// Builds the registration for `reminder`.
    ///
    /// Returns `None` when the reminder has no coordinates.
    pub fn for_reminder(reminder: &Reminder, config: &GeofenceConfig) -> Option<Self> {
        let (latitude, longitude) = reminder.coordinates()?;
        Some(Self {
            request_id: reminder.id.clone(),
            latitude,
            longitude,
            radius_meters: config.radius_meters,
            loiter_delay_ms: config.loiter_delay_ms,
            expiration: Expiration::Never,
            transitions: TransitionMask::ENTER,
        })
    }
}

/// Batch submitted in one platform call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofencingRequest {
    pub geofences: Vec<GeofenceRegistration>,
    pub initial_trigger: InitialTrigger,
}

impl GeofencingRequest {
    pub fn new(geofences: Vec<GeofenceRegistration>) -> Self {
        Self {
            geofences,
            initial_trigger: InitialTrigger::Enter,
        }
    }

    /// Builds the single batch that re-registers stored reminders.
    ///
    /// Reminders that are not activatable are left out and listed in
    /// `skipped`; input order is kept on both sides.
    pub fn restore_plan(
        reminders: &[Reminder],
        config: &GeofenceConfig,
    ) -> (Self, RestoreSummary) {
        let mut summary = RestoreSummary::default();
        let mut geofences = Vec::new();
        for reminder in reminders {
            match GeofenceRegistration::for_reminder(reminder, config) {
                Some(registration) if ensure_activatable(reminder).is_ok() => {
                    summary.registered.push(reminder.id.clone());
                    geofences.push(registration);
                }
                _ => summary.skipped.push(reminder.id.clone()),
            }
        }
        (Self::new(geofences), summary)
    }

    pub fn is_empty(&self) -> bool {
        self.geofences.is_empty()
    }

    pub fn request_ids(&self) -> Vec<&str> {
        self.geofences
            .iter()
            .map(|geofence| geofence.request_id.as_str())
            .collect()
    }
}

/// Result of re-registering stored reminders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    pub registered: Vec<ReminderId>,
    /// Stored reminders that are not activatable.
    pub skipped: Vec<ReminderId>,
}

/// Stable address the platform invokes when a registered region fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackTarget {
    pub action: String,
    pub request_code: i32,
    /// Reminder ids whose registrations route to this target.
    pub context_ids: Vec<ReminderId>,
}

impl CallbackTarget {
    pub fn for_request(request: &GeofencingRequest, config: &GeofenceConfig) -> Self {
        Self {
            action: config.action.clone(),
            request_code: config.callback_request_code,
            context_ids: request
                .geofences
                .iter()
                .map(|geofence| geofence.request_id.clone())
                .collect(),
        }
    }
}
