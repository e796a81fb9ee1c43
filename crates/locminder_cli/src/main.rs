//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `locminder_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use locminder_core::{
    GeofenceConfig, GeofenceRegistration, Reminder, ReminderStore, SqliteReminderStore,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("locminder_core ping={}", locminder_core::ping());
    println!("locminder_core version={}", locminder_core::core_version());

    let config = GeofenceConfig::default();
    println!(
        "geofence radius_meters={} loiter_delay_ms={} action={}",
        config.radius_meters, config.loiter_delay_ms, config.action
    );

    match check_storage(&config) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("storage check failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn check_storage(config: &GeofenceConfig) -> Result<String, Box<dyn std::error::Error>> {
    let store = SqliteReminderStore::open_in_memory()?;
    let sample = Reminder::with_id("smoke")
        .title("smoke")
        .location_name("origin")
        .at(0.0, 0.0);
    store.save(&sample)?;
    let stored = store.get_all()?;
    let registrations = stored
        .iter()
        .filter_map(|reminder| GeofenceRegistration::for_reminder(reminder, config))
        .count();
    Ok(format!(
        "storage reminders={} registrations={registrations}",
        stored.len()
    ))
}
