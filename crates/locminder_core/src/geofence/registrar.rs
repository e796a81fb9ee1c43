//! Geofence activation state machine.
//!
//! # Responsibility
//! - Walk one activation attempt through permission check, device settings
//!   check and platform registration.
//! - Persist the reminder once the platform has accepted its registration.
//! - Re-register stored reminders after a restart.
//!
//! # Invariants
//! - Register first, then persist. A reminder is never left registered
//!   without a row beyond the single save call that follows registration;
//!   if that save fails the registration is removed.
//! - Permission denial is terminal for the attempt; nothing is retried.
//! - The settings resolution prompt is shown at most once per attempt and
//!   followed by exactly one re-check without resolution.
//! - Once the attempt's token is cancelled no further state is entered.
//! - Each attempt awaits its own platform futures, so concurrent attempts
//!   for different reminders never observe each other's results.

use super::cancel::{CancelToken, Cancelled};
use super::platform::{LocationPlatform, LocationPriority, SettingsState};
use super::registration::{
    CallbackTarget, GeofenceRegistration, GeofencingRequest, RestoreSummary,
};
use crate::config::GeofenceConfig;
use crate::model::outcome::Outcome;
use crate::model::reminder::{Reminder, ReminderId};
use crate::repo::reminder_repo::ReminderRepository;
use crate::service::validator::{ensure_activatable, ValidationFailure};
use crate::store::ReminderStore;
use log::{debug, error, info, warn};

/// States of one activation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrarState {
    Idle,
    PermissionCheck,
    PermissionGranted,
    PermissionDenied,
    SettingsCheck,
    SettingsSatisfied,
    SettingsResolutionRequested,
    SettingsUnsatisfied,
    Registering,
    Registered,
    RegistrationFailed,
    Cancelled,
}

impl RegistrarState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PermissionCheck => "permission_check",
            Self::PermissionGranted => "permission_granted",
            Self::PermissionDenied => "permission_denied",
            Self::SettingsCheck => "settings_check",
            Self::SettingsSatisfied => "settings_satisfied",
            Self::SettingsResolutionRequested => "settings_resolution_requested",
            Self::SettingsUnsatisfied => "settings_unsatisfied",
            Self::Registering => "registering",
            Self::Registered => "registered",
            Self::RegistrationFailed => "registration_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Terminal result of one activation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Registered with the platform and persisted.
    Registered,
    /// The user declined location access; they must change it in settings.
    PermissionDenied,
    /// Device location is still off after the one automatic retry. The caller
    /// offers a manual retry that calls [`GeofenceRegistrar::retry_settings`].
    SettingsUnsatisfied,
    /// The platform rejected the registration or the save failed.
    RegistrationFailed(String),
    /// The reminder is incomplete and never reached negotiation.
    Rejected(ValidationFailure),
    /// The hosting scope was torn down mid-negotiation.
    Cancelled,
}

/// Outcome of an attempt together with the states it went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub reminder_id: ReminderId,
    pub outcome: ActivationOutcome,
    pub trail: Vec<RegistrarState>,
}

struct Attempt {
    reminder_id: ReminderId,
    trail: Vec<RegistrarState>,
}

impl Attempt {
    fn start(reminder_id: &str) -> Self {
        let mut attempt = Self {
            reminder_id: reminder_id.to_string(),
            trail: Vec::new(),
        };
        attempt.enter(RegistrarState::Idle);
        attempt
    }

    fn enter(&mut self, state: RegistrarState) {
        info!(
            "event=geofence_state module=geofence reminder_id={} state={}",
            self.reminder_id,
            state.as_str()
        );
        self.trail.push(state);
    }

    fn finish(mut self, outcome: ActivationOutcome) -> Activation {
        match &outcome {
            ActivationOutcome::Registered => {}
            ActivationOutcome::PermissionDenied => self.enter(RegistrarState::PermissionDenied),
            ActivationOutcome::SettingsUnsatisfied => {
                self.enter(RegistrarState::SettingsUnsatisfied)
            }
            ActivationOutcome::RegistrationFailed(_) => {
                self.enter(RegistrarState::RegistrationFailed)
            }
            ActivationOutcome::Rejected(_) => {}
            ActivationOutcome::Cancelled => {
                // Recorded for the caller only; cancelled attempts log nothing further.
                self.trail.push(RegistrarState::Cancelled);
            }
        }
        Activation {
            reminder_id: self.reminder_id,
            outcome,
            trail: self.trail,
        }
    }
}

/// Negotiates location access and registers reminders with the platform.
pub struct GeofenceRegistrar<S: ReminderStore + 'static> {
    repo: ReminderRepository<S>,
    platform: LocationPlatform,
    config: GeofenceConfig,
}

impl<S: ReminderStore + 'static> GeofenceRegistrar<S> {
    pub fn new(
        repo: ReminderRepository<S>,
        platform: LocationPlatform,
        config: GeofenceConfig,
    ) -> Self {
        Self {
            repo,
            platform,
            config,
        }
    }

    pub fn config(&self) -> &GeofenceConfig {
        &self.config
    }

    /// Runs a full activation attempt for a validated reminder.
    pub async fn activate(&self, reminder: &Reminder, token: &CancelToken) -> Activation {
        let mut attempt = Attempt::start(&reminder.id);
        if let Err(failure) = ensure_activatable(reminder) {
            warn!(
                "event=geofence_activate module=geofence status=rejected reminder_id={} reason={failure}",
                reminder.id
            );
            return attempt.finish(ActivationOutcome::Rejected(failure));
        }

        attempt.enter(RegistrarState::PermissionCheck);
        let status = self.platform.permissions.status();
        if !status.is_granted() {
            let answered = match token.guard(self.platform.permissions.request(status)).await {
                Ok(answered) => answered,
                Err(Cancelled) => return attempt.finish(ActivationOutcome::Cancelled),
            };
            if !answered.is_granted() {
                info!(
                    "event=geofence_permission module=geofence status=denied reminder_id={} foreground={} background={}",
                    reminder.id, answered.foreground, answered.background
                );
                return attempt.finish(ActivationOutcome::PermissionDenied);
            }
        }
        attempt.enter(RegistrarState::PermissionGranted);

        self.settings_then_register(attempt, reminder, token).await
    }

    /// Manual retry after [`ActivationOutcome::SettingsUnsatisfied`]: restarts
    /// at the settings check with the resolution prompt allowed again.
    pub async fn retry_settings(&self, reminder: &Reminder, token: &CancelToken) -> Activation {
        let attempt = Attempt::start(&reminder.id);
        if let Err(failure) = ensure_activatable(reminder) {
            return attempt.finish(ActivationOutcome::Rejected(failure));
        }
        self.settings_then_register(attempt, reminder, token).await
    }

    async fn settings_then_register(
        &self,
        mut attempt: Attempt,
        reminder: &Reminder,
        token: &CancelToken,
    ) -> Activation {
        let mut resolve = true;
        loop {
            attempt.enter(RegistrarState::SettingsCheck);
            let checked = match token
                .guard(self.platform.settings.check(LocationPriority::LowPower))
                .await
            {
                Ok(checked) => checked,
                Err(Cancelled) => return attempt.finish(ActivationOutcome::Cancelled),
            };

            match checked {
                Ok(SettingsState::Satisfied) => break,
                Ok(SettingsState::Resolvable) if resolve => {
                    attempt.enter(RegistrarState::SettingsResolutionRequested);
                    match token
                        .guard(self.platform.settings.request_resolution())
                        .await
                    {
                        Ok(Ok(())) => resolve = false,
                        Ok(Err(err)) => {
                            warn!(
                                "event=geofence_settings module=geofence status=error reminder_id={} error_code=resolution_unavailable error={err}",
                                attempt.reminder_id
                            );
                            return attempt.finish(ActivationOutcome::SettingsUnsatisfied);
                        }
                        Err(Cancelled) => return attempt.finish(ActivationOutcome::Cancelled),
                    }
                }
                Ok(_) => return attempt.finish(ActivationOutcome::SettingsUnsatisfied),
                Err(err) => {
                    warn!(
                        "event=geofence_settings module=geofence status=error reminder_id={} error_code=settings_check_failed error={err}",
                        attempt.reminder_id
                    );
                    return attempt.finish(ActivationOutcome::SettingsUnsatisfied);
                }
            }
        }
        attempt.enter(RegistrarState::SettingsSatisfied);

        self.register(attempt, reminder, token).await
    }

    async fn register(
        &self,
        mut attempt: Attempt,
        reminder: &Reminder,
        token: &CancelToken,
    ) -> Activation {
        attempt.enter(RegistrarState::Registering);
        let Some(registration) = GeofenceRegistration::for_reminder(reminder, &self.config) else {
            return attempt.finish(ActivationOutcome::Rejected(
                ValidationFailure::MissingLocation,
            ));
        };
        let request = GeofencingRequest::new(vec![registration]);
        let target = CallbackTarget::for_request(&request, &self.config);

        match token
            .guard(self.platform.geofencing.add_geofences(request, target))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(
                    "event=geofence_register module=geofence status=error reminder_id={} error={err}",
                    reminder.id
                );
                return attempt.finish(ActivationOutcome::RegistrationFailed(err.to_string()));
            }
            Err(Cancelled) => {
                self.remove_quietly(&reminder.id).await;
                return attempt.finish(ActivationOutcome::Cancelled);
            }
        }

        if let Outcome::Error(message) = self.repo.save_reminder(reminder).await {
            error!(
                "event=geofence_register module=geofence status=error reminder_id={} error_code=save_failed error={message}",
                reminder.id
            );
            self.remove_quietly(&reminder.id).await;
            return attempt.finish(ActivationOutcome::RegistrationFailed(message));
        }

        attempt.enter(RegistrarState::Registered);
        attempt.finish(ActivationOutcome::Registered)
    }

    /// Re-registers every activatable stored reminder in one request.
    ///
    /// Safe to repeat: the platform replaces registrations with the same id.
    pub async fn restore_registrations(&self, token: &CancelToken) -> Outcome<RestoreSummary> {
        let reminders = match self.repo.get_reminders().await {
            Outcome::Success(reminders) => reminders,
            Outcome::Error(message) => return Outcome::Error(message),
        };

        let (request, summary) = GeofencingRequest::restore_plan(&reminders, &self.config);
        if request.is_empty() {
            debug!(
                "event=geofence_restore module=geofence status=ok registered=0 skipped={}",
                summary.skipped.len()
            );
            return Outcome::Success(summary);
        }

        let target = CallbackTarget::for_request(&request, &self.config);
        match token
            .guard(self.platform.geofencing.add_geofences(request, target))
            .await
        {
            Ok(Ok(())) => {
                info!(
                    "event=geofence_restore module=geofence status=ok registered={} skipped={}",
                    summary.registered.len(),
                    summary.skipped.len()
                );
                Outcome::Success(summary)
            }
            Ok(Err(err)) => {
                error!("event=geofence_restore module=geofence status=error error={err}");
                Outcome::Error(err.to_string())
            }
            Err(Cancelled) => Outcome::Error("geofence restore was cancelled".to_string()),
        }
    }

    /// Deregisters the given reminder ids.
    pub async fn remove_registrations(&self, ids: Vec<ReminderId>) -> Outcome<()> {
        if ids.is_empty() {
            return Outcome::Success(());
        }
        let count = ids.len();
        let removed = self.platform.geofencing.remove_geofences(ids).await;
        if let Err(err) = &removed {
            warn!("event=geofence_remove module=geofence status=error count={count} error={err}");
        }
        removed.into()
    }

    /// Clears storage, then deregisters exactly the reminders it removed.
    ///
    /// If deregistration fails the rows are already gone; the leftover
    /// registrations then fire as stale events and are dropped.
    pub async fn clear_all(&self) -> Outcome<Vec<ReminderId>> {
        let removed = match self.repo.take_all_reminders().await {
            Outcome::Success(removed) => removed,
            Outcome::Error(message) => return Outcome::Error(message),
        };
        self.remove_registrations(removed.clone())
            .await
            .map(|()| removed)
    }

    async fn remove_quietly(&self, id: &str) {
        if let Err(err) = self
            .platform
            .geofencing
            .remove_geofences(vec![id.to_string()])
            .await
        {
            warn!(
                "event=geofence_rollback module=geofence status=error reminder_id={id} error={err}"
            );
        }
    }
}
