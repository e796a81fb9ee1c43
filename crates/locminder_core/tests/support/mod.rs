#![allow(dead_code)]

use async_trait::async_trait;
use locminder_core::{
    CallbackTarget, GeofenceConfig, GeofenceRegistrar, GeofencingClient, GeofencingRequest,
    LocationPermissions, LocationPlatform, LocationPriority, LocationSettings,
    MemoryReminderStore, PermissionStatus, PlatformError, Reminder, ReminderNotification,
    ReminderNotifier, ReminderRepository, SettingsState,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const GRANTED: PermissionStatus = PermissionStatus {
    foreground: true,
    background: true,
    background_required: true,
};

pub const DENIED: PermissionStatus = PermissionStatus {
    foreground: false,
    background: false,
    background_required: true,
};

pub fn reminder(id: &str) -> Reminder {
    Reminder::with_id(id)
        .title(format!("title-{id}"))
        .description(format!("description-{id}"))
        .location_name(format!("somewhere-{id}"))
        .at(11.0, 11.0)
}

pub struct FakePermissions {
    status: Mutex<PermissionStatus>,
    answer: PermissionStatus,
    pub requests: AtomicUsize,
}

impl FakePermissions {
    pub fn new(status: PermissionStatus, answer: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(status),
            answer,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(GRANTED, GRANTED)
    }
}

#[async_trait]
impl LocationPermissions for FakePermissions {
    fn status(&self) -> PermissionStatus {
        *self.status.lock().unwrap()
    }

    async fn request(&self, _missing: PermissionStatus) -> PermissionStatus {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.status.lock().unwrap() = self.answer;
        self.answer
    }
}

pub struct FakeSettings {
    checks: Mutex<VecDeque<Result<SettingsState, PlatformError>>>,
    pub check_count: AtomicUsize,
    pub resolutions: AtomicUsize,
    resolution: Result<(), PlatformError>,
    /// When set, `check` waits for a notification before answering.
    pub gate: Option<Arc<Notify>>,
}

impl FakeSettings {
    /// Answers checks from `checks` in order, then `Satisfied`.
    pub fn answering(checks: Vec<SettingsState>) -> Self {
        Self {
            checks: Mutex::new(checks.into_iter().map(Ok).collect()),
            check_count: AtomicUsize::new(0),
            resolutions: AtomicUsize::new(0),
            resolution: Ok(()),
            gate: None,
        }
    }

    pub fn satisfied() -> Self {
        Self::answering(Vec::new())
    }

    pub fn with_failing_resolution(mut self) -> Self {
        self.resolution = Err(PlatformError::new("cannot show resolution"));
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl LocationSettings for FakeSettings {
    async fn check(&self, priority: LocationPriority) -> Result<SettingsState, PlatformError> {
        assert_eq!(priority, LocationPriority::LowPower);
        self.check_count.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.checks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SettingsState::Satisfied))
    }

    async fn request_resolution(&self) -> Result<(), PlatformError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.resolution.clone()
    }
}

#[derive(Default)]
pub struct FakeGeofencing {
    pub added: Mutex<Vec<(GeofencingRequest, CallbackTarget)>>,
    pub removed: Mutex<Vec<String>>,
    pub rejected_ids: Mutex<HashSet<String>>,
    /// Per-id latency before `add_geofences` answers.
    pub delays: Mutex<Vec<(String, Duration)>>,
}

impl FakeGeofencing {
    pub fn reject(&self, id: &str) {
        self.rejected_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn delay(&self, id: &str, delay: Duration) {
        self.delays.lock().unwrap().push((id.to_string(), delay));
    }

    /// Ids currently registered: added minus removed.
    pub fn active_ids(&self) -> Vec<String> {
        let removed = self.removed.lock().unwrap().clone();
        let mut ids: Vec<String> = self
            .added
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(request, _)| request.geofences.iter().map(|g| g.request_id.clone()))
            .filter(|id| !removed.contains(id))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn add_calls(&self) -> usize {
        self.added.lock().unwrap().len()
    }
}

#[async_trait]
impl GeofencingClient for FakeGeofencing {
    async fn add_geofences(
        &self,
        request: GeofencingRequest,
        target: CallbackTarget,
    ) -> Result<(), PlatformError> {
        let ids: Vec<String> = request
            .geofences
            .iter()
            .map(|g| g.request_id.clone())
            .collect();
        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| ids.contains(id))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let rejected = {
            let rejected_ids = self.rejected_ids.lock().unwrap();
            ids.iter().any(|id| rejected_ids.contains(id))
        };
        if rejected {
            return Err(PlatformError::with_code(1001, "GEOFENCE_TOO_MANY_GEOFENCES"));
        }
        self.added.lock().unwrap().push((request, target));
        Ok(())
    }

    async fn remove_geofences(&self, request_ids: Vec<String>) -> Result<(), PlatformError> {
        self.removed.lock().unwrap().extend(request_ids);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<ReminderNotification>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ReminderNotifier for RecordingNotifier {
    async fn notify(&self, notification: ReminderNotification) {
        self.sent.lock().unwrap().push(notification);
    }
}

pub struct Harness {
    pub store: Arc<MemoryReminderStore>,
    pub repo: ReminderRepository<Arc<MemoryReminderStore>>,
    pub permissions: Arc<FakePermissions>,
    pub settings: Arc<FakeSettings>,
    pub geofencing: Arc<FakeGeofencing>,
    pub registrar: Arc<GeofenceRegistrar<Arc<MemoryReminderStore>>>,
}

impl Harness {
    pub fn new(permissions: FakePermissions, settings: FakeSettings) -> Self {
        Self::with_store(MemoryReminderStore::new(), permissions, settings)
    }

    pub fn granted() -> Self {
        Self::new(FakePermissions::granted(), FakeSettings::satisfied())
    }

    pub fn with_store(
        store: MemoryReminderStore,
        permissions: FakePermissions,
        settings: FakeSettings,
    ) -> Self {
        let store = Arc::new(store);
        let repo = ReminderRepository::new(Arc::clone(&store));
        let permissions = Arc::new(permissions);
        let settings = Arc::new(settings);
        let geofencing = Arc::new(FakeGeofencing::default());
        let platform = LocationPlatform {
            permissions: permissions.clone(),
            settings: settings.clone(),
            geofencing: geofencing.clone(),
        };
        let registrar = Arc::new(GeofenceRegistrar::new(
            repo.clone(),
            platform,
            GeofenceConfig::default(),
        ));
        Self {
            store,
            repo,
            permissions,
            settings,
            geofencing,
            registrar,
        }
    }
}
