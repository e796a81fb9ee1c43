//! Geofence configuration.
//!
//! # Responsibility
//! - Hold the process-wide geofence defaults (radius, loiter delay, callback
//!   action) as one explicit value passed to the registrar and the event
//!   handler.
//! - Parse host-provided overrides from JSON.
//!
//! # Invariants
//! - `radius_meters` is finite and positive.
//! - `action` is non-empty; it routes platform broadcasts to the handler.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Action discriminator used to route geofence broadcasts.
pub const ACTION_GEOFENCE_EVENT: &str = "locminder.action.ACTION_GEOFENCE_EVENT";
/// Circular region radius in meters.
pub const DEFAULT_RADIUS_METERS: f32 = 500.0;
/// Dwell time before a dwell transition would fire. Only ENTER is requested.
pub const DEFAULT_LOITER_DELAY_MS: u32 = 1000;
/// Request code attached to the registration callback target.
pub const DEFAULT_CALLBACK_REQUEST_CODE: i32 = 0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeofenceConfig {
    pub radius_meters: f32,
    pub loiter_delay_ms: u32,
    pub action: String,
    pub callback_request_code: i32,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            loiter_delay_ms: DEFAULT_LOITER_DELAY_MS,
            action: ACTION_GEOFENCE_EVENT.to_string(),
            callback_request_code: DEFAULT_CALLBACK_REQUEST_CODE,
        }
    }
}

impl GeofenceConfig {
    /// Parses overrides from JSON; omitted fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err(ConfigError::InvalidRadius(self.radius_meters));
        }
        if self.action.trim().is_empty() {
            return Err(ConfigError::EmptyAction);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    InvalidRadius(f32),
    EmptyAction,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid geofence config: {message}"),
            Self::InvalidRadius(value) => {
                write!(f, "geofence radius must be a positive number of meters, got {value}")
            }
            Self::EmptyAction => write!(f, "geofence callback action must not be empty"),
        }
    }
}

impl Error for ConfigError {}
