//! Reminder domain model.
//!
//! # Responsibility
//! - Define the record persisted by `ReminderStore` and monitored by the
//!   geofence registrar.
//!
//! # Invariants
//! - `id` is generated once and never reused for another reminder.
//! - A reminder is activatable only when `title`, `latitude` and `longitude`
//!   are all present.
//! - `latitude` and `longitude` are written together by the edit flow.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable reminder identifier. Also used as the geofence request id.
pub type ReminderId = String;

/// Location-based reminder record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Human-readable label picked on the map, e.g. a POI name.
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Reminder {
    /// Creates an empty reminder with a freshly generated id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Creates an empty reminder with a caller-provided id.
    ///
    /// Used by restore paths and tests where identity already exists.
    pub fn with_id(id: impl Into<ReminderId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            location_name: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn location_name(mut self, location_name: impl Into<String>) -> Self {
        self.location_name = Some(location_name.into());
        self
    }

    /// Sets both coordinates at once.
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Returns `(latitude, longitude)` when both are set and finite.
    ///
    /// SQLite stores NaN as NULL, so a non-finite coordinate would not survive
    /// a round trip; it is treated as absent here.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Some((latitude, longitude))
            }
            _ => None,
        }
    }
}

impl Default for Reminder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Reminder;

    #[test]
    fn new_generates_distinct_ids() {
        let first = Reminder::new();
        let second = Reminder::new();
        assert_ne!(first.id, second.id);
        assert!(!first.id.is_empty());
    }

    #[test]
    fn coordinates_require_both_values() {
        let mut reminder = Reminder::with_id("r1").at(10.0, 20.0);
        assert_eq!(reminder.coordinates(), Some((10.0, 20.0)));

        reminder.longitude = None;
        assert_eq!(reminder.coordinates(), None);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let reminder = Reminder::with_id("r1").location_name("Office");
        let json = serde_json::to_string(&reminder).expect("reminder should serialize");
        assert!(json.contains("\"locationName\":\"Office\""));
    }
}
