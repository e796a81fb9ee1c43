//! Geofence transition intake.
//!
//! # Responsibility
//! - Accept transition payloads delivered by the host's broadcast path.
//! - Resolve triggering ids against the repository and hand matching
//!   reminders to the notifier.
//!
//! # Invariants
//! - Handling never fails past this boundary: malformed payloads and
//!   platform error codes are logged and swallowed.
//! - Only ENTER transitions produce notifications.
//! - A triggering id without a stored reminder is a stale registration and
//!   is dropped without escalation.

use super::registration::{TransitionMask, GEOFENCE_TRANSITION_ENTER};
use crate::config::GeofenceConfig;
use crate::model::outcome::Outcome;
use crate::model::reminder::{Reminder, ReminderId};
use crate::repo::reminder_repo::ReminderRepository;
use crate::store::ReminderStore;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

/// Payload delivered with a geofence broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceEvent {
    #[serde(default)]
    pub error_code: Option<i32>,
    pub transition_type: i32,
    #[serde(rename = "triggeringRegionIds")]
    pub triggering_ids: Vec<String>,
}

impl GeofenceEvent {
    pub fn entered(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            error_code: None,
            transition_type: GEOFENCE_TRANSITION_ENTER,
            triggering_ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Data handed to the host for a local notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderNotification {
    pub reminder_id: ReminderId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<Reminder> for ReminderNotification {
    fn from(value: Reminder) -> Self {
        Self {
            reminder_id: value.id,
            title: value.title,
            description: value.description,
            location_name: value.location_name,
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

/// Sink for user-visible reminder notifications.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify(&self, notification: ReminderNotification);
}

#[async_trait]
impl<N: ReminderNotifier + ?Sized> ReminderNotifier for std::sync::Arc<N> {
    async fn notify(&self, notification: ReminderNotification) {
        (**self).notify(notification).await
    }
}

/// Why an event produced no notifications at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoredReason {
    UnknownAction(String),
    Malformed(String),
    PlatformError(i32),
    UnsupportedTransition(i32),
}

/// What one event delivery did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventReport {
    pub notified: Vec<ReminderId>,
    /// Ids without a stored reminder (stale registrations).
    pub dropped: Vec<ReminderId>,
    /// Ids whose lookup failed for another reason.
    pub failed: Vec<ReminderId>,
    pub ignored: Option<IgnoredReason>,
}

impl EventReport {
    fn ignored(reason: IgnoredReason) -> Self {
        Self {
            ignored: Some(reason),
            ..Self::default()
        }
    }
}

pub struct GeofenceEventHandler<S: ReminderStore + 'static, N: ReminderNotifier> {
    repo: ReminderRepository<S>,
    notifier: N,
    action: String,
    transitions: TransitionMask,
}

impl<S: ReminderStore + 'static, N: ReminderNotifier> GeofenceEventHandler<S, N> {
    pub fn new(repo: ReminderRepository<S>, notifier: N, config: &GeofenceConfig) -> Self {
        Self {
            repo,
            notifier,
            action: config.action.clone(),
            transitions: TransitionMask::ENTER,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Parses a JSON payload and handles it. Malformed JSON is logged.
    pub async fn handle_json(&self, action: &str, payload: &str) -> EventReport {
        match serde_json::from_str::<GeofenceEvent>(payload) {
            Ok(event) => self.handle(action, &event).await,
            Err(err) => {
                error!(
                    "event=geofence_event module=geofence status=error error_code=malformed_payload error={err}"
                );
                EventReport::ignored(IgnoredReason::Malformed(err.to_string()))
            }
        }
    }

    /// Handles one delivered transition event.
    pub async fn handle(&self, action: &str, event: &GeofenceEvent) -> EventReport {
        if action != self.action {
            debug!("event=geofence_event module=geofence status=ignored reason=unknown_action");
            return EventReport::ignored(IgnoredReason::UnknownAction(action.to_string()));
        }
        if let Some(code) = event.error_code {
            error!(
                "event=geofence_event module=geofence status=error error_code={code} ids={}",
                event.triggering_ids.len()
            );
            return EventReport::ignored(IgnoredReason::PlatformError(code));
        }
        if !self.transitions.contains(event.transition_type) {
            debug!(
                "event=geofence_event module=geofence status=ignored transition_type={}",
                event.transition_type
            );
            return EventReport::ignored(IgnoredReason::UnsupportedTransition(
                event.transition_type,
            ));
        }

        let mut report = EventReport::default();
        for id in &event.triggering_ids {
            match self.repo.get_reminder(id).await {
                Outcome::Success(reminder) => {
                    self.notifier.notify(reminder.into()).await;
                    report.notified.push(id.clone());
                }
                outcome if outcome.is_not_found() => {
                    debug!(
                        "event=geofence_event module=geofence status=dropped reason=stale_registration reminder_id={id}"
                    );
                    report.dropped.push(id.clone());
                }
                Outcome::Error(message) => {
                    warn!(
                        "event=geofence_event module=geofence status=error reminder_id={id} error={message}"
                    );
                    report.failed.push(id.clone());
                }
            }
        }

        info!(
            "event=geofence_event module=geofence status=ok notified={} dropped={} failed={}",
            report.notified.len(),
            report.dropped.len(),
            report.failed.len()
        );
        report
    }
}
