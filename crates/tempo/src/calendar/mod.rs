//! Calendar service boundary.
//!
//! A [`CalendarService`] performs one authenticated call per
//! [`CalendarRequest`] and returns the service's JSON response. The tools in
//! [`tools`] translate validated model arguments into requests;
//! [`google::GoogleCalendarClient`] sends them to Google Calendar v3.

pub mod google;
pub mod tools;

use crate::error::CalendarError;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub use google::GoogleCalendarClient;
pub use tools::{CalendarToolKind, CalendarToolsExt, ColorId};

/// The calendar every tool defaults to.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Boxed future returned by [`CalendarService::call`].
pub type CalendarFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, CalendarError>> + Send + 'a>>;

/// One remote calendar operation per call.
///
/// Implementations must not retry or deduplicate: a repeated create request
/// creates another event.
pub trait CalendarService: Send + Sync {
    fn call(&self, request: CalendarRequest) -> CalendarFuture<'_>;
}

/// A single calendar operation, fully resolved and ready to send.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarRequest {
    CreateEvent {
        calendar_id: String,
        event: EventPayload,
    },
    SearchEvents(EventQuery),
    UpdateEvent {
        calendar_id: String,
        event_id: String,
        patch: EventPayload,
    },
    MoveEvent {
        source_calendar_id: String,
        event_id: String,
        destination_calendar_id: String,
    },
    DeleteEvent {
        calendar_id: String,
        event_id: String,
    },
    ListCalendars,
}

impl CalendarRequest {
    /// Short operation label for logs.
    pub fn operation(&self) -> &'static str {
        match self {
            CalendarRequest::CreateEvent { .. } => "create",
            CalendarRequest::SearchEvents(_) => "search",
            CalendarRequest::UpdateEvent { .. } => "update",
            CalendarRequest::MoveEvent { .. } => "move",
            CalendarRequest::DeleteEvent { .. } => "delete",
            CalendarRequest::ListCalendars => "list_calendars",
        }
    }
}

/// Event resource body (Google Calendar field names). Absent fields are
/// left out, so the same type serves as a full body and as a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
}

impl EventPayload {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Wall-clock start or end with its IANA zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// `YYYY-MM-DDTHH:MM:SS`, local to `time_zone`.
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub email: String,
}

/// Event listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    /// RFC 3339 lower bound (exclusive end time filter).
    pub time_min: Option<String>,
    /// RFC 3339 upper bound (exclusive start time filter).
    pub time_max: Option<String>,
    /// Free-text search.
    pub query: Option<String>,
    pub max_results: u32,
}

// ── Time helpers ───────────────────────────────────────────────────

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Map a user-facing zone name to the IANA name the calendar expects.
/// Bare `UTC` becomes `Etc/UTC`; other names are trimmed.
pub fn normalize_timezone(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.eq_ignore_ascii_case("utc") {
        "Etc/UTC".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse and normalize an IANA zone name.
pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    let normalized = normalize_timezone(name);
    normalized
        .parse::<Tz>()
        .map_err(|_| format!("'{name}' is not a valid IANA timezone"))
}

/// Parse a wall-clock datetime in one of the accepted layouts
/// (`YYYY-MM-DD[T ]HH:MM[:SS]`).
pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| format!("'{value}' is not a datetime in YYYY-MM-DD HH:MM[:SS] form"))
}

/// Build an [`EventTime`] from a wall-clock string and zone name.
pub fn event_time(datetime: &str, timezone: &str) -> Result<EventTime, String> {
    let naive = parse_naive_datetime(datetime)?;
    let tz = parse_timezone(timezone)?;
    Ok(EventTime {
        date_time: naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
        time_zone: tz.name().to_string(),
    })
}

/// Resolve a search bound to RFC 3339. Values that already carry an offset
/// are kept; wall-clock values are placed in `tz` (earliest instant when a
/// DST fold makes them ambiguous).
pub fn to_rfc3339(value: &str, tz: Tz) -> Result<String, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value.trim()) {
        return Ok(dt.to_rfc3339());
    }
    let naive = parse_naive_datetime(value)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| format!("'{value}' does not exist in {}", tz.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn utc_is_normalized() {
        assert_eq!(normalize_timezone("UTC"), "Etc/UTC");
        assert_eq!(normalize_timezone(" utc "), "Etc/UTC");
        assert_eq!(normalize_timezone("Europe/Istanbul"), "Europe/Istanbul");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        assert!(parse_timezone("Mars/Olympus").is_err());
        assert_eq!(parse_timezone("UTC").unwrap().name(), "Etc/UTC");
    }

    #[test]
    fn accepted_datetime_layouts() {
        for value in [
            "2025-03-04T10:00:00",
            "2025-03-04 10:00:00",
            "2025-03-04T10:00",
            "2025-03-04 10:00",
        ] {
            let t = event_time(value, "Europe/Berlin").unwrap();
            assert_eq!(t.date_time, "2025-03-04T10:00:00", "{value}");
            assert_eq!(t.time_zone, "Europe/Berlin");
        }
        assert!(parse_naive_datetime("tomorrow at ten").is_err());
    }

    #[test]
    fn rfc3339_from_wall_clock() {
        let tz: Tz = "Europe/Istanbul".parse().unwrap();
        assert_eq!(
            to_rfc3339("2025-03-04 10:00", tz).unwrap(),
            "2025-03-04T10:00:00+03:00"
        );
        assert_eq!(
            to_rfc3339("2025-03-04T10:00:00Z", tz).unwrap(),
            "2025-03-04T10:00:00+00:00"
        );
    }

    #[test]
    fn payload_serializes_google_field_names() {
        let payload = EventPayload {
            summary: Some("Standup".into()),
            start: Some(event_time("2025-03-04 10:00", "UTC").unwrap()),
            color_id: Some("10".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "summary": "Standup",
                "start": {"dateTime": "2025-03-04T10:00:00", "timeZone": "Etc/UTC"},
                "colorId": "10"
            })
        );
        assert!(EventPayload::default().is_empty());
        assert!(!payload.is_empty());
    }
}
