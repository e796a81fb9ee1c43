//! Platform seams for location permission, device settings and geofencing.
//!
//! Hosts implement these traits over the OS location services. Every async
//! method may suspend pending a user interaction or a platform callback; the
//! registrar races each call against its cancellation token.

use super::registration::{CallbackTarget, GeofencingRequest};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Snapshot of the location permission grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionStatus {
    pub foreground: bool,
    pub background: bool,
    /// Whether the platform version grants background location separately.
    pub background_required: bool,
}

impl PermissionStatus {
    /// Foreground is always required; background only when separately granted.
    pub fn is_granted(&self) -> bool {
        self.foreground && (self.background || !self.background_required)
    }
}

/// Location accuracy the settings check is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPriority {
    LowPower,
    Balanced,
    HighAccuracy,
}

/// Result of a device location settings query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsState {
    Satisfied,
    /// Unsatisfied, but the user can be prompted to fix it.
    Resolvable,
    Unresolvable,
}

/// Failure reported by a platform service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub code: Option<i32>,
    pub message: String,
}

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {code})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for PlatformError {}

#[async_trait]
pub trait LocationPermissions: Send + Sync {
    fn status(&self) -> PermissionStatus;

    /// Asks the user for the missing grants and resolves with the new status.
    async fn request(&self, missing: PermissionStatus) -> PermissionStatus;
}

#[async_trait]
pub trait LocationSettings: Send + Sync {
    async fn check(&self, priority: LocationPriority) -> Result<SettingsState, PlatformError>;

    /// Shows the one-shot "turn on location" prompt and resolves once the user
    /// has answered. `Err` means the prompt could not be shown.
    async fn request_resolution(&self) -> Result<(), PlatformError>;
}

#[async_trait]
pub trait GeofencingClient: Send + Sync {
    async fn add_geofences(
        &self,
        request: GeofencingRequest,
        target: CallbackTarget,
    ) -> Result<(), PlatformError>;

    async fn remove_geofences(&self, request_ids: Vec<String>) -> Result<(), PlatformError>;
}

/// Bundle of platform services injected into the registrar.
#[derive(Clone)]
pub struct LocationPlatform {
    pub permissions: Arc<dyn LocationPermissions>,
    pub settings: Arc<dyn LocationSettings>,
    pub geofencing: Arc<dyn GeofencingClient>,
}
