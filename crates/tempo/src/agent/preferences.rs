//! User scheduling preferences.
//!
//! Read from a user-editable YAML document once per invocation and rendered
//! into a short bullet summary for the system prompt. Never written by the
//! agent.

use chrono_tz::Tz;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::{debug, warn};

/// Structured scheduling preferences. Every field is optional; empty strings
/// and empty lists count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPreferences {
    /// IANA timezone, e.g. `Europe/Istanbul`.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Active work days, e.g. `[mon, tue, wed]`.
    #[serde(default)]
    pub workdays: Option<Vec<String>>,
    /// Per-day working window in document order, e.g. `mon: "09:00-18:00"`.
    #[serde(default, deserialize_with = "ordered_windows")]
    pub working_hours: Option<Vec<(String, String)>>,
    #[serde(default)]
    pub lunch: Option<String>,
    /// Windows to keep free of meetings, e.g. `Fri 14:00-16:00`.
    #[serde(default)]
    pub no_meetings: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_deep_work: Option<Vec<String>>,
    #[serde(default)]
    pub avoid_times: Option<Vec<String>>,
    /// Free text. Informational only; never summarized.
    #[serde(default)]
    pub notes: Option<String>,
}

impl UserPreferences {
    /// Parse a YAML document. An empty, comment-only or `null` document
    /// yields the default record.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        let has_content = text
            .lines()
            .map(str::trim)
            .any(|l| !l.is_empty() && !l.starts_with('#') && l != "---");
        if !has_content {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str::<Option<Self>>(text)?.unwrap_or_default())
    }

    /// Load from `path`. Returns `None` when the file is missing, unreadable
    /// or not a valid preferences document.
    pub fn load(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No preferences file at {}", path.display());
            return None;
        }
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                warn!("Could not read preferences {}: {e}", path.display());
                return None;
            }
        };
        match Self::from_yaml_str(&text) {
            Ok(prefs) => {
                debug!("Loaded preferences from {}", path.display());
                Some(prefs)
            }
            Err(e) => {
                warn!("Ignoring invalid preferences {}: {e}", path.display());
                None
            }
        }
    }

    /// The timezone, when it names a real IANA zone.
    pub fn tz(&self) -> Option<Tz> {
        present(&self.timezone).and_then(|name| crate::calendar::parse_timezone(name).ok())
    }

    /// Summary bullets in fixed order: timezone, workdays, working hours,
    /// lunch, meeting-free windows, deep-work windows, times to avoid.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(tz) = present(&self.timezone) {
            lines.push(format!("- Timezone: {tz}"));
        }
        if let Some(days) = non_empty(&self.workdays) {
            lines.push(format!("- Workdays: {}", days.join(", ")));
        }
        if let Some(hours) = self.working_hours.as_deref().filter(|h| !h.is_empty()) {
            let parts: Vec<String> = hours.iter().map(|(day, win)| format!("{day}: {win}")).collect();
            lines.push(format!("- Working hours: {}", parts.join("; ")));
        }
        if let Some(lunch) = present(&self.lunch) {
            lines.push(format!("- Lunch break: {lunch}"));
        }
        if let Some(windows) = non_empty(&self.no_meetings) {
            lines.push(format!("- No meetings: {}", windows.join("; ")));
        }
        if let Some(windows) = non_empty(&self.preferred_deep_work) {
            lines.push(format!("- Preferred deep work: {}", windows.join("; ")));
        }
        if let Some(windows) = non_empty(&self.avoid_times) {
            lines.push(format!("- Times to avoid: {}", windows.join("; ")));
        }
        lines
    }

    /// `"User profile:"` followed by the summary bullets, or `None` when no
    /// summarized field is set.
    pub fn summary(&self) -> Option<String> {
        let lines = self.summary_lines();
        if lines.is_empty() {
            return None;
        }
        Some(format!("User profile:\n{}", lines.join("\n")))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn non_empty(values: &Option<Vec<String>>) -> Option<Vec<&str>> {
    let kept: Vec<&str> = values
        .as_deref()?
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    (!kept.is_empty()).then_some(kept)
}

// ── Ordered map deserialization ─────────────────────────────────────

/// `Mapping` keeps document order.
fn ordered_windows<'de, D>(deserializer: D) -> Result<Option<Vec<(String, String)>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(map) = Option::<Mapping>::deserialize(deserializer)? else {
        return Ok(None);
    };
    map.into_iter()
        .map(|entry| match entry {
            (Value::String(day), Value::String(window)) => Ok((day, window)),
            (day, _) => Err(D::Error::custom(format!(
                "working_hours entry {day:?} must map a day name to a time window string"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"
timezone: Europe/Istanbul
workdays: [mon, tue, wed, thu, fri]
working_hours:
  fri: "10:00-16:00"
  mon: "09:00-18:00"
  tue: "09:00-18:00"
lunch: "12:30-13:30"
no_meetings: ["Fri 14:00-16:00"]
preferred_deep_work: ["09:00-11:00", "16:00-18:00"]
avoid_times: ["18:00-21:00"]
notes: "Avoid late-night heavy tasks."
"#;

    #[test]
    fn working_hours_keep_document_order() {
        let prefs = UserPreferences::from_yaml_str(FULL).unwrap();
        let days: Vec<&str> = prefs
            .working_hours
            .as_ref()
            .unwrap()
            .iter()
            .map(|(d, _)| d.as_str())
            .collect();
        assert_eq!(days, vec!["fri", "mon", "tue"]);
    }

    #[test]
    fn timezone_only_yields_one_bullet() {
        let prefs = UserPreferences {
            timezone: Some("Europe/Istanbul".into()),
            ..Default::default()
        };
        assert_eq!(prefs.summary_lines(), vec!["- Timezone: Europe/Istanbul"]);
        assert_eq!(
            prefs.summary().unwrap(),
            "User profile:\n- Timezone: Europe/Istanbul"
        );
    }

    #[test]
    fn full_record_yields_seven_bullets_in_order_without_notes() {
        let prefs = UserPreferences::from_yaml_str(FULL).unwrap();
        let lines = prefs.summary_lines();
        assert_eq!(
            lines,
            vec![
                "- Timezone: Europe/Istanbul",
                "- Workdays: mon, tue, wed, thu, fri",
                "- Working hours: fri: 10:00-16:00; mon: 09:00-18:00; tue: 09:00-18:00",
                "- Lunch break: 12:30-13:30",
                "- No meetings: Fri 14:00-16:00",
                "- Preferred deep work: 09:00-11:00; 16:00-18:00",
                "- Times to avoid: 18:00-21:00",
            ]
        );
        assert!(!prefs.summary().unwrap().contains("late-night"));
    }

    #[test]
    fn blank_values_count_as_absent() {
        let prefs = UserPreferences::from_yaml_str("timezone: \"  \"\nworkdays: []\nlunch: ''\nnotes: hi\n")
            .unwrap();
        assert!(prefs.summary_lines().is_empty());
        assert!(prefs.summary().is_none());
    }

    #[test]
    fn null_fields_are_accepted() {
        let prefs = UserPreferences::from_yaml_str("timezone:\nworking_hours:\nworkdays:\n").unwrap();
        assert_eq!(prefs, UserPreferences::default());
    }

    #[test]
    fn null_document_is_default() {
        assert_eq!(UserPreferences::from_yaml_str("~\n").unwrap(), UserPreferences::default());
        assert_eq!(UserPreferences::from_yaml_str("null").unwrap(), UserPreferences::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_profile.yaml");
        std::fs::write(&path, "---\n~\n").unwrap();
        assert_eq!(UserPreferences::load(&path), Some(UserPreferences::default()));
    }

    #[test]
    fn working_hours_need_string_windows() {
        assert!(UserPreferences::from_yaml_str("working_hours:\n  mon: [9, 18]\n").is_err());
    }

    #[test]
    fn comment_only_document_is_default() {
        let prefs = UserPreferences::from_yaml_str("# nothing yet\n\n").unwrap();
        assert_eq!(prefs, UserPreferences::default());
    }

    #[test]
    fn load_missing_or_invalid_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(UserPreferences::load(dir.path().join("absent.yaml")).is_none());

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "workdays: {not: [a list}\n").unwrap();
        assert!(UserPreferences::load(&bad).is_none());

        let wrong_shape = dir.path().join("wrong.yaml");
        std::fs::write(&wrong_shape, "working_hours: [mon, tue]\n").unwrap();
        assert!(UserPreferences::load(&wrong_shape).is_none());
    }

    #[test]
    fn load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let prefs = UserPreferences::load(file.path()).unwrap();
        assert_eq!(prefs.lunch.as_deref(), Some("12:30-13:30"));
        assert_eq!(prefs.tz().unwrap().name(), "Europe/Istanbul");
    }

    #[test]
    fn invalid_timezone_has_no_tz() {
        let prefs = UserPreferences {
            timezone: Some("Nowhere/Special".into()),
            ..Default::default()
        };
        assert!(prefs.tz().is_none());
        // Still summarized verbatim.
        assert_eq!(prefs.summary_lines().len(), 1);
    }
}
