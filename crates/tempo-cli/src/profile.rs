//! The user preferences file: starter template and display.

use anyhow::Context;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempo::agent::UserPreferences;

pub const PROFILE_TEMPLATE: &str = r#"# User profile for tempo
#
# Relocate with the CALENDAR_CLI_PROFILE variable or pass --path to the
# profile commands. Keep times in 24h HH:MM-HH:MM form.

timezone: Europe/Istanbul
workdays: [mon, tue, wed, thu, fri]
working_hours:
  mon: "09:00-18:00"
  tue: "09:00-18:00"
  wed: "09:00-18:00"
  thu: "09:00-18:00"
  fri: "09:00-18:00"
lunch: "12:30-13:30"
no_meetings: ["Fri 14:00-16:00"]
preferred_deep_work: ["09:00-11:00", "16:00-18:00"]
avoid_times: ["18:00-21:00"]
notes: "Avoid heavy tasks late at night."
"#;

/// Write `contents` to `path` unless a file is already there. Returns
/// whether the file was created.
pub fn write_if_missing(path: &Path, contents: &str) -> anyhow::Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e).with_context(|| format!("failed to create {}", path.display())),
    };
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

/// Create the starter profile at `path` if it does not exist.
pub fn init_profile(path: &Path) -> anyhow::Result<bool> {
    write_if_missing(path, PROFILE_TEMPLATE)
}

/// What `show-profile` prints for the profile at `path`.
pub fn describe_profile(path: &Path) -> Option<String> {
    let prefs = UserPreferences::load(path)?;
    Some(
        prefs
            .summary()
            .unwrap_or_else(|| "The profile has no scheduling preferences set.".to_string()),
    )
}
