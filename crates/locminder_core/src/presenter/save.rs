//! Save-reminder presenter.
//!
//! Holds the draft being edited, validates it on save and drives the
//! registrar. Every registrar outcome maps to at most one user message.

use crate::geofence::cancel::CancelToken;
use crate::geofence::registrar::{Activation, ActivationOutcome, GeofenceRegistrar};
use crate::model::reminder::{Reminder, ReminderId};
use crate::service::validator::{first_missing_field, ValidationFailure};
use crate::store::ReminderStore;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub const MESSAGE_ENTER_TITLE: &str = "Please enter title";
pub const MESSAGE_SELECT_LOCATION: &str = "Please select location";
pub const MESSAGE_PERMISSION_DENIED: &str =
    "Location permission was not granted. Reminders need location access all the time.";
pub const MESSAGE_LOCATION_REQUIRED: &str =
    "Location services must be enabled to use location reminders";
pub const MESSAGE_REMINDER_SAVED: &str = "Reminder Saved !";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDuration {
    Short,
    Long,
    /// Stays until dismissed or its action is taken.
    Indefinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    /// Open the app's system settings page.
    OpenSettings,
    /// Call [`SaveReminderPresenter::retry_settings`].
    RetrySettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub text: String,
    pub duration: MessageDuration,
    pub action: Option<MessageAction>,
}

impl UserMessage {
    fn short(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            duration: MessageDuration::Short,
            action: None,
        }
    }

    fn long(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            duration: MessageDuration::Long,
            action: None,
        }
    }

    fn indefinite(text: impl Into<String>, action: MessageAction) -> Self {
        Self {
            text: text.into(),
            duration: MessageDuration::Indefinite,
            action: Some(action),
        }
    }
}

/// Fields entered on the save screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ReminderDraft {
    fn to_reminder(&self, id: ReminderId) -> Reminder {
        Reminder {
            id,
            title: self.title.clone(),
            description: self.description.clone(),
            location_name: self.location_name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReminderViewState {
    pub draft: ReminderDraft,
    pub loading: bool,
    pub message: Option<UserMessage>,
    /// Set once the reminder is registered and persisted.
    pub saved: Option<ReminderId>,
}

pub struct SaveReminderPresenter<S: ReminderStore + 'static> {
    registrar: Arc<GeofenceRegistrar<S>>,
    state: watch::Sender<SaveReminderViewState>,
    /// Reminder of the last attempt that stopped at the settings check; a
    /// manual retry reuses its id.
    pending: Mutex<Option<Reminder>>,
}

impl<S: ReminderStore + 'static> SaveReminderPresenter<S> {
    pub fn new(registrar: Arc<GeofenceRegistrar<S>>) -> Self {
        let (state, _) = watch::channel(SaveReminderViewState::default());
        Self {
            registrar,
            state,
            pending: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveReminderViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SaveReminderViewState {
        self.state.borrow().clone()
    }

    pub fn set_title(&self, title: Option<String>) {
        self.state.send_modify(|state| state.draft.title = title);
    }

    pub fn set_description(&self, description: Option<String>) {
        self.state
            .send_modify(|state| state.draft.description = description);
    }

    /// Applies a point picked on the map.
    pub fn select_location(&self, name: Option<String>, latitude: f64, longitude: f64) {
        self.state.send_modify(|state| {
            state.draft.location_name = name;
            state.draft.latitude = Some(latitude);
            state.draft.longitude = Some(longitude);
        });
    }

    /// Validates `candidate` and surfaces one message naming the missing
    /// field category. Returns whether it may be activated.
    pub fn validate_entered_data(&self, candidate: &Reminder) -> bool {
        match first_missing_field(candidate) {
            None => true,
            Some(failure) => {
                let text = match failure {
                    ValidationFailure::MissingTitle => MESSAGE_ENTER_TITLE,
                    ValidationFailure::MissingLocation => MESSAGE_SELECT_LOCATION,
                };
                self.state
                    .send_modify(|state| state.message = Some(UserMessage::short(text)));
                false
            }
        }
    }

    /// Validates the draft under a fresh id and runs a full activation.
    ///
    /// Returns `None` when validation failed and nothing was attempted.
    pub async fn save(&self, token: &CancelToken) -> Option<Activation> {
        let candidate = self.state.borrow().draft.to_reminder(Reminder::new().id);
        if !self.validate_entered_data(&candidate) {
            return None;
        }

        self.state.send_modify(|state| {
            state.loading = true;
            state.message = None;
        });
        let activation = self.registrar.activate(&candidate, token).await;
        self.apply(&candidate, &activation);
        Some(activation)
    }

    /// Manual retry after the location-settings error. Returns `None` when
    /// there is no attempt waiting on settings.
    pub async fn retry_settings(&self, token: &CancelToken) -> Option<Activation> {
        let pending = self.take_pending()?;
        self.state.send_modify(|state| {
            state.loading = true;
            state.message = None;
        });
        let activation = self.registrar.retry_settings(&pending, token).await;
        self.apply(&pending, &activation);
        Some(activation)
    }

    pub fn dismiss_message(&self) {
        self.state
            .send_if_modified(|state| state.message.take().is_some());
    }

    /// Resets the screen to an empty draft.
    pub fn on_clear(&self) {
        self.take_pending();
        self.state
            .send_replace(SaveReminderViewState::default());
    }

    fn apply(&self, reminder: &Reminder, activation: &Activation) {
        if activation.outcome == ActivationOutcome::Cancelled {
            return;
        }
        if activation.outcome == ActivationOutcome::SettingsUnsatisfied {
            self.set_pending(Some(reminder.clone()));
        }

        self.state.send_modify(|state| {
            state.loading = false;
            state.message = match &activation.outcome {
                ActivationOutcome::Registered => {
                    state.saved = Some(reminder.id.clone());
                    Some(UserMessage::short(MESSAGE_REMINDER_SAVED))
                }
                ActivationOutcome::PermissionDenied => Some(UserMessage::indefinite(
                    MESSAGE_PERMISSION_DENIED,
                    MessageAction::OpenSettings,
                )),
                ActivationOutcome::SettingsUnsatisfied => Some(UserMessage::indefinite(
                    MESSAGE_LOCATION_REQUIRED,
                    MessageAction::RetrySettings,
                )),
                ActivationOutcome::RegistrationFailed(message) => Some(UserMessage::long(
                    format!("An exception occurred: {message}"),
                )),
                ActivationOutcome::Rejected(ValidationFailure::MissingTitle) => {
                    Some(UserMessage::short(MESSAGE_ENTER_TITLE))
                }
                ActivationOutcome::Rejected(ValidationFailure::MissingLocation) => {
                    Some(UserMessage::short(MESSAGE_SELECT_LOCATION))
                }
                ActivationOutcome::Cancelled => None,
            };
        });
    }

    fn take_pending(&self) -> Option<Reminder> {
        match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    fn set_pending(&self, reminder: Option<Reminder>) {
        match self.pending.lock() {
            Ok(mut pending) => *pending = reminder,
            Err(poisoned) => *poisoned.into_inner() = reminder,
        }
    }
}
