//! FFI use-case API for host (Flutter) calls.
//!
//! # Responsibility
//! - Expose reminder storage and geofence event intake to Dart via FRB.
//! - Hand the host everything it needs to call the platform geofencing
//!   client itself; permission and settings prompts stay host-side.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Storage is opened lazily once per process at the configured path.
//! - One geofence config per process: restore plans and event intake always
//!   agree on the callback action.
//! - Response envelopes carry `ok` plus a human-readable `message`.

use async_trait::async_trait;
use locminder_core::presenter::save::{MESSAGE_ENTER_TITLE, MESSAGE_SELECT_LOCATION};
use locminder_core::service::validator::first_missing_field;
use locminder_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CallbackTarget, GeofenceConfig, GeofenceEventHandler, GeofencingRequest, IgnoredReason,
    Outcome, Reminder, ReminderNotification, ReminderNotifier, ReminderRepository,
    SqliteReminderStore, ValidationFailure,
};
use log::{info, warn};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tokio::runtime::{Builder, Runtime};

const DB_FILE_NAME: &str = "locminder.sqlite3";
const DB_PATH_ENV: &str = "LOCMINDER_DB_PATH";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static REPOSITORY: OnceCell<ReminderRepository<SqliteReminderStore>> = OnceCell::new();
static GEOFENCE_CONFIG: OnceCell<GeofenceConfig> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the SQLite file used by every storage call.
///
/// Must run before the first storage call; afterwards only the same path is
/// accepted. Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_storage(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "storage already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Pins the geofence config used by restore plans and event intake.
///
/// `config_json` holds overrides such as `{"action": "...", "radius_meters": 250.0}`.
/// Must run before the first geofence call, which otherwise pins the
/// defaults; afterwards only an equal config is accepted. Returns empty
/// string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_geofence(config_json: String) -> String {
    let requested = match GeofenceConfig::from_json(&config_json) {
        Ok(config) => config,
        Err(err) => return err.to_string(),
    };
    let active = GEOFENCE_CONFIG.get_or_init(|| requested.clone());
    if *active == requested {
        info!(
            "event=ffi_geofence_config module=ffi status=ok action={} radius_meters={}",
            active.action, active.radius_meters
        );
        String::new()
    } else {
        format!(
            "geofence config already pinned with action `{}`; refusing to switch to `{}`",
            active.action, requested.action
        )
    }
}

/// Reminder as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderItem {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<Reminder> for ReminderItem {
    fn from(value: Reminder) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            location_name: value.location_name,
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

impl From<ReminderItem> for Reminder {
    fn from(value: ReminderItem) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            location_name: value.location_name,
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

impl From<ReminderNotification> for ReminderItem {
    fn from(value: ReminderNotification) -> Self {
        Self {
            id: value.reminder_id,
            title: value.title,
            description: value.description,
            location_name: value.location_name,
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderActionResponse {
    pub ok: bool,
    pub message: String,
}

impl ReminderActionResponse {
    fn from_outcome(outcome: Outcome<()>, success: &str) -> Self {
        match outcome {
            Outcome::Success(()) => Self {
                ok: true,
                message: success.to_string(),
            },
            Outcome::Error(message) => Self { ok: false, message },
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderListResponse {
    pub ok: bool,
    /// Sorted by id; empty on failure.
    pub items: Vec<ReminderItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderLookupResponse {
    pub ok: bool,
    pub item: Option<ReminderItem>,
    /// `Reminder not found!` for an unknown id.
    pub message: String,
}

/// Ids removed by [`reminders_clear`]; the host deregisters them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderClearResponse {
    pub ok: bool,
    pub cleared_ids: Vec<String>,
    pub message: String,
}

/// Result of one geofence broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceEventResponse {
    /// Reminders to show as local notifications.
    pub notifications: Vec<ReminderItem>,
    /// Triggering ids without a stored reminder.
    pub dropped_ids: Vec<String>,
    /// Set when the event produced nothing at all.
    pub ignored_reason: Option<String>,
}

/// Registration payload for re-adding stored reminders after a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePlanResponse {
    pub ok: bool,
    /// `{"request": GeofencingRequest, "target": CallbackTarget}` as JSON;
    /// empty when nothing is activatable or on failure.
    pub payload_json: String,
    pub registered_ids: Vec<String>,
    pub skipped_ids: Vec<String>,
    pub message: String,
}

/// Persists a reminder the host has already registered with the platform.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Incomplete reminders are rejected with the matching prompt text.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_save(item: ReminderItem) -> ReminderActionResponse {
    let reminder = Reminder::from(item);
    if let Some(failure) = first_missing_field(&reminder) {
        return ReminderActionResponse::failure(match failure {
            ValidationFailure::MissingTitle => MESSAGE_ENTER_TITLE,
            ValidationFailure::MissingLocation => MESSAGE_SELECT_LOCATION,
        });
    }
    match with_repository(|repo| async move { repo.save_reminder(&reminder).await }) {
        Ok(outcome) => ReminderActionResponse::from_outcome(outcome, "Reminder saved."),
        Err(err) => ReminderActionResponse::failure(err),
    }
}

/// Lists all stored reminders sorted by id.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_list() -> ReminderListResponse {
    match with_repository(|repo| async move { repo.get_reminders().await }) {
        Ok(Outcome::Success(reminders)) => {
            let items: Vec<ReminderItem> = reminders.into_iter().map(Into::into).collect();
            let message = if items.is_empty() {
                "No reminders.".to_string()
            } else {
                format!("Found {} reminder(s).", items.len())
            };
            ReminderListResponse {
                ok: true,
                items,
                message,
            }
        }
        Ok(Outcome::Error(message)) | Err(message) => ReminderListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Looks up one reminder by id.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_get(id: String) -> ReminderLookupResponse {
    match with_repository(|repo| async move { repo.get_reminder(&id).await }) {
        Ok(Outcome::Success(reminder)) => ReminderLookupResponse {
            ok: true,
            item: Some(reminder.into()),
            message: String::new(),
        },
        Ok(Outcome::Error(message)) | Err(message) => ReminderLookupResponse {
            ok: false,
            item: None,
            message,
        },
    }
}

/// Deletes one reminder. The host removes its geofence.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_delete(id: String) -> ReminderActionResponse {
    match with_repository(|repo| async move { repo.delete_reminder(&id).await }) {
        Ok(outcome) => ReminderActionResponse::from_outcome(outcome, "Reminder deleted."),
        Err(err) => ReminderActionResponse::failure(err),
    }
}

/// Deletes every reminder and returns the removed ids.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_clear() -> ReminderClearResponse {
    match with_repository(|repo| async move { repo.take_all_reminders().await }) {
        Ok(Outcome::Success(cleared_ids)) => ReminderClearResponse {
            ok: true,
            message: format!("Cleared {} reminder(s).", cleared_ids.len()),
            cleared_ids,
        },
        Ok(Outcome::Error(message)) | Err(message) => ReminderClearResponse {
            ok: false,
            cleared_ids: Vec::new(),
            message,
        },
    }
}

/// Handles a geofence broadcast delivered to the host.
///
/// `payload_json` is `{"errorCode"?, "transitionType", "triggeringRegionIds"}`.
///
/// # FFI contract
/// - Never fails: malformed payloads come back as `ignored_reason`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn geofence_event_received(action: String, payload_json: String) -> GeofenceEventResponse {
    let handled = with_repository(|repo| async move {
        let handler = GeofenceEventHandler::new(
            repo,
            CollectingNotifier::default(),
            active_geofence_config(),
        );
        let report = handler.handle_json(&action, &payload_json).await;
        (report, handler.notifier().take())
    });
    match handled {
        Ok((report, notifications)) => GeofenceEventResponse {
            notifications: notifications.into_iter().map(Into::into).collect(),
            dropped_ids: report.dropped,
            ignored_reason: report.ignored.map(|reason| ignored_label(&reason)),
        },
        Err(err) => {
            warn!("event=ffi_geofence_event module=ffi status=error error={err}");
            GeofenceEventResponse {
                notifications: Vec::new(),
                dropped_ids: Vec::new(),
                ignored_reason: Some(err),
            }
        }
    }
}

/// Builds one registration request covering every activatable stored
/// reminder, addressed to the pinned geofence config.
#[flutter_rust_bridge::frb(sync)]
pub fn geofence_restore_plan() -> RestorePlanResponse {
    let config = active_geofence_config();
    let reminders = match with_repository(|repo| async move { repo.get_reminders().await }) {
        Ok(Outcome::Success(reminders)) => reminders,
        Ok(Outcome::Error(message)) | Err(message) => {
            return RestorePlanResponse::failure(message)
        }
    };

    let (request, summary) = GeofencingRequest::restore_plan(&reminders, config);
    let registered_ids = summary.registered;
    let skipped_ids = summary.skipped;
    if request.is_empty() {
        return RestorePlanResponse {
            ok: true,
            payload_json: String::new(),
            registered_ids,
            skipped_ids,
            message: "Nothing to register.".to_string(),
        };
    }

    let target = CallbackTarget::for_request(&request, config);
    match serde_json::to_string(&serde_json::json!({ "request": request, "target": target })) {
        Ok(payload_json) => {
            info!(
                "event=ffi_restore_plan module=ffi status=ok registered={} skipped={}",
                registered_ids.len(),
                skipped_ids.len()
            );
            RestorePlanResponse {
                ok: true,
                payload_json,
                message: format!("Prepared {} registration(s).", registered_ids.len()),
                registered_ids,
                skipped_ids,
            }
        }
        Err(err) => RestorePlanResponse::failure(format!("restore plan encode failed: {err}")),
    }
}

impl RestorePlanResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload_json: String::new(),
            registered_ids: Vec::new(),
            skipped_ids: Vec::new(),
            message: message.into(),
        }
    }
}

#[derive(Default)]
struct CollectingNotifier {
    sent: Mutex<Vec<ReminderNotification>>,
}

impl CollectingNotifier {
    fn take(&self) -> Vec<ReminderNotification> {
        match self.sent.lock() {
            Ok(mut sent) => std::mem::take(&mut *sent),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl ReminderNotifier for CollectingNotifier {
    async fn notify(&self, notification: ReminderNotification) {
        match self.sent.lock() {
            Ok(mut sent) => sent.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

fn ignored_label(reason: &IgnoredReason) -> String {
    match reason {
        IgnoredReason::UnknownAction(action) => format!("unknown action `{action}`"),
        IgnoredReason::Malformed(err) => format!("malformed payload: {err}"),
        IgnoredReason::PlatformError(code) => format!("platform error code {code}"),
        IgnoredReason::UnsupportedTransition(kind) => format!("unsupported transition {kind}"),
    }
}

fn active_geofence_config() -> &'static GeofenceConfig {
    GEOFENCE_CONFIG.get_or_init(GeofenceConfig::default)
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn runtime() -> Result<&'static Runtime, String> {
    RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("locminder-ffi")
            .build()
            .map_err(|err| format!("async runtime init failed: {err}"))
    })
}

fn repository() -> Result<&'static ReminderRepository<SqliteReminderStore>, String> {
    REPOSITORY.get_or_try_init(|| {
        let db_path = resolve_db_path();
        let store = SqliteReminderStore::open(&db_path)
            .map_err(|err| format!("reminder DB open failed: {err}"))?;
        info!(
            "event=ffi_storage_open module=ffi status=ok db_path={}",
            db_path.display()
        );
        Ok(ReminderRepository::new(store))
    })
}

fn with_repository<F, Fut, T>(f: F) -> Result<T, String>
where
    F: FnOnce(ReminderRepository<SqliteReminderStore>) -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let repo = repository()?.clone();
    Ok(runtime()?.block_on(f(repo)))
}

#[cfg(test)]
mod tests {
    use super::{
        configure_geofence, configure_storage, core_version, geofence_event_received,
        geofence_restore_plan, init_logging, ping, reminder_delete, reminder_get, reminder_save,
        reminders_list, ReminderItem,
    };
    use locminder_core::presenter::save::MESSAGE_ENTER_TITLE;
    use locminder_core::{ACTION_GEOFENCE_EVENT, REMINDER_NOT_FOUND};
    use std::time::{SystemTime, UNIX_EPOCH};

    const HOST_ACTION: &str = "com.host.CUSTOM_GEOFENCE";
    const HOST_GEOFENCE_CONFIG: &str =
        r#"{"action":"com.host.CUSTOM_GEOFENCE","radius_meters":250.0}"#;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn configure_storage_rejects_empty_path() {
        assert!(!configure_storage("  ".to_string()).is_empty());
    }

    #[test]
    fn saved_reminder_is_listed_and_found() {
        let id = unique_token("ffi-save");
        let saved = reminder_save(item(&id));
        assert!(saved.ok, "{}", saved.message);

        let lookup = reminder_get(id.clone());
        assert!(lookup.ok, "{}", lookup.message);
        assert_eq!(lookup.item, Some(item(&id)));
        assert!(reminders_list().items.iter().any(|listed| listed.id == id));
    }

    #[test]
    fn unknown_id_reports_not_found() {
        let lookup = reminder_get(unique_token("ffi-missing"));
        assert!(!lookup.ok);
        assert_eq!(lookup.message, REMINDER_NOT_FOUND);
    }

    #[test]
    fn incomplete_reminder_is_not_saved() {
        let id = unique_token("ffi-incomplete");
        let response = reminder_save(ReminderItem {
            title: None,
            ..item(&id)
        });
        assert!(!response.ok);
        assert_eq!(response.message, MESSAGE_ENTER_TITLE);
        assert!(!reminder_get(id).ok);
    }

    #[test]
    fn delete_removes_the_reminder() {
        let id = unique_token("ffi-delete");
        assert!(reminder_save(item(&id)).ok);
        assert!(reminder_delete(id.clone()).ok);
        assert_eq!(reminder_get(id).message, REMINDER_NOT_FOUND);
    }

    #[test]
    fn enter_event_returns_notification_for_stored_reminder() {
        pin_host_geofence_config();
        let id = unique_token("ffi-event");
        assert!(reminder_save(item(&id)).ok);
        let payload = format!(r#"{{"transitionType":1,"triggeringRegionIds":["{id}","gone"]}}"#);

        let response = geofence_event_received(HOST_ACTION.to_string(), payload);

        assert_eq!(response.notifications, vec![item(&id)]);
        assert_eq!(response.dropped_ids, vec!["gone".to_string()]);
        assert_eq!(response.ignored_reason, None);
    }

    #[test]
    fn malformed_event_is_ignored() {
        pin_host_geofence_config();
        let response = geofence_event_received(HOST_ACTION.to_string(), "{".to_string());
        assert!(response.notifications.is_empty());
        assert!(response.ignored_reason.is_some());
    }

    #[test]
    fn events_follow_the_action_used_for_registration() {
        pin_host_geofence_config();
        let id = unique_token("ffi-custom-action");
        assert!(reminder_save(item(&id)).ok);

        let plan = geofence_restore_plan();
        assert!(plan.ok, "{}", plan.message);
        assert!(plan.registered_ids.contains(&id));
        assert!(plan.payload_json.contains(HOST_ACTION));
        assert!(plan.payload_json.contains(r#""radius_meters":250.0"#));

        let payload = format!(r#"{{"transitionType":1,"triggeringRegionIds":["{id}"]}}"#);
        let response = geofence_event_received(HOST_ACTION.to_string(), payload.clone());
        assert_eq!(response.notifications.len(), 1);
        assert_eq!(response.ignored_reason, None);

        let stale = geofence_event_received(ACTION_GEOFENCE_EVENT.to_string(), payload);
        assert!(stale.notifications.is_empty());
        assert!(stale.ignored_reason.is_some());
    }

    #[test]
    fn configure_geofence_rejects_invalid_and_conflicting_config() {
        pin_host_geofence_config();
        assert!(!configure_geofence(r#"{"radius_meters":-1.0}"#.to_string()).is_empty());
        assert!(!configure_geofence("{}".to_string()).is_empty());
        assert!(configure_geofence(HOST_GEOFENCE_CONFIG.to_string()).is_empty());
    }

    fn pin_host_geofence_config() {
        let error = configure_geofence(HOST_GEOFENCE_CONFIG.to_string());
        assert!(error.is_empty(), "{error}");
    }

    fn item(id: &str) -> ReminderItem {
        ReminderItem {
            id: id.to_string(),
            title: Some("Buy milk".to_string()),
            description: Some("two litres".to_string()),
            location_name: Some("Corner shop".to_string()),
            latitude: Some(11.0),
            longitude: Some(11.0),
        }
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
