//! The six calendar tools.
//!
//! The tool set is closed: one [`CalendarToolKind`] variant per tool, each
//! with a typed argument struct whose JSON Schema is what the model sees.
//! Every variant follows the same path: deserialize, check what the schema
//! cannot express (datetime layout, zone names, end after start), build a
//! [`CalendarRequest`], and make exactly one service call.

use super::{
    Attendee, CalendarRequest, CalendarService, EventPayload, EventQuery, PRIMARY_CALENDAR,
    event_time, parse_naive_datetime, parse_timezone, to_rfc3339,
};
use crate::error::{RegistryError, ToolError};
use crate::json_schema_for;
use crate::tools::core::{Tool, ToolFuture, ToolRegistry};
use crate::tools::spec::ToolSpec;
use crate::ToolDef;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

// ── Tool name constants ─────────────────────────────────────────────

pub const CREATE_EVENT: &str = "create_calendar_event";
pub const SEARCH_EVENTS: &str = "search_events";
pub const UPDATE_EVENT: &str = "update_calendar_event";
pub const MOVE_EVENT: &str = "move_calendar_event";
pub const DELETE_EVENT: &str = "delete_calendar_event";
pub const LIST_CALENDARS: &str = "get_calendars_info";

const MAX_SEARCH_RESULTS: u32 = 250;

fn primary_calendar() -> String {
    PRIMARY_CALENDAR.to_string()
}

fn default_max_results() -> u32 {
    10
}

// ── Argument types ──────────────────────────────────────────────────

/// Google Calendar event color: 1 Lavender, 2 Sage, 3 Grape, 4 Flamingo,
/// 5 Banana, 6 Tangerine, 7 Peacock, 8 Graphite, 9 Blueberry, 10 Basil,
/// 11 Tomato. For "green" use 10 (Basil); for "red" use 11 (Tomato).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ColorId {
    #[serde(rename = "1")]
    Lavender,
    #[serde(rename = "2")]
    Sage,
    #[serde(rename = "3")]
    Grape,
    #[serde(rename = "4")]
    Flamingo,
    #[serde(rename = "5")]
    Banana,
    #[serde(rename = "6")]
    Tangerine,
    #[serde(rename = "7")]
    Peacock,
    #[serde(rename = "8")]
    Graphite,
    #[serde(rename = "9")]
    Blueberry,
    #[serde(rename = "10")]
    Basil,
    #[serde(rename = "11")]
    Tomato,
}

impl ColorId {
    pub const ALL: [ColorId; 11] = [
        ColorId::Lavender,
        ColorId::Sage,
        ColorId::Grape,
        ColorId::Flamingo,
        ColorId::Banana,
        ColorId::Tangerine,
        ColorId::Peacock,
        ColorId::Graphite,
        ColorId::Blueberry,
        ColorId::Basil,
        ColorId::Tomato,
    ];

    /// The wire id, `"1"` to `"11"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ColorId::Lavender => "1",
            ColorId::Sage => "2",
            ColorId::Grape => "3",
            ColorId::Flamingo => "4",
            ColorId::Banana => "5",
            ColorId::Tangerine => "6",
            ColorId::Peacock => "7",
            ColorId::Graphite => "8",
            ColorId::Blueberry => "9",
            ColorId::Basil => "10",
            ColorId::Tomato => "11",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorId::Lavender => "Lavender",
            ColorId::Sage => "Sage",
            ColorId::Grape => "Grape",
            ColorId::Flamingo => "Flamingo",
            ColorId::Banana => "Banana",
            ColorId::Tangerine => "Tangerine",
            ColorId::Peacock => "Peacock",
            ColorId::Graphite => "Graphite",
            ColorId::Blueberry => "Blueberry",
            ColorId::Basil => "Basil",
            ColorId::Tomato => "Tomato",
        }
    }
}

/// Whether the event blocks time on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    /// Busy.
    Opaque,
    /// Free.
    Transparent,
}

impl Transparency {
    fn as_str(self) -> &'static str {
        match self {
            Transparency::Opaque => "opaque",
            Transparency::Transparent => "transparent",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateEventArgs {
    /// Event title.
    pub summary: String,
    /// Start, wall-clock in `timezone`: `YYYY-MM-DD HH:MM` or `YYYY-MM-DDTHH:MM:SS`.
    pub start_datetime: String,
    /// End, same layout as `start_datetime`. Must be after the start.
    pub end_datetime: String,
    /// IANA timezone name, e.g. `Europe/Istanbul`.
    pub timezone: String,
    /// Target calendar id.
    #[serde(default = "primary_calendar")]
    pub calendar_id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Attendee email addresses.
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
    #[serde(default)]
    pub color_id: Option<ColorId>,
    #[serde(default)]
    pub transparency: Option<Transparency>,
    /// RFC 5545 lines, e.g. `RRULE:FREQ=WEEKLY;BYDAY=MO`.
    #[serde(default)]
    pub recurrence: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchEventsArgs {
    #[serde(default = "primary_calendar")]
    pub calendar_id: String,
    /// Only events ending after this instant. Wall-clock in `timezone`, or RFC 3339.
    #[serde(default)]
    pub min_datetime: Option<String>,
    /// Only events starting before this instant. Wall-clock in `timezone`, or RFC 3339.
    #[serde(default)]
    pub max_datetime: Option<String>,
    /// IANA timezone for wall-clock bounds. Defaults to UTC.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Free-text match against title, description, location and attendees.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_max_results")]
    #[schemars(range(min = 1, max = 250))]
    pub max_results: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateEventArgs {
    /// Id of the event to change (from `search_events`).
    pub event_id: String,
    #[serde(default = "primary_calendar")]
    pub calendar_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// New start, wall-clock in `timezone`.
    #[serde(default)]
    pub start_datetime: Option<String>,
    /// New end, wall-clock in `timezone`.
    #[serde(default)]
    pub end_datetime: Option<String>,
    /// IANA timezone; required when changing start or end.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Replaces the attendee list.
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
    #[serde(default)]
    pub color_id: Option<ColorId>,
    #[serde(default)]
    pub transparency: Option<Transparency>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveEventArgs {
    pub event_id: String,
    /// Calendar currently holding the event.
    #[serde(default = "primary_calendar")]
    pub source_calendar_id: String,
    pub destination_calendar_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteEventArgs {
    pub event_id: String,
    #[serde(default = "primary_calendar")]
    pub calendar_id: String,
}

// ── Tool kinds ──────────────────────────────────────────────────────

/// The closed set of calendar tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarToolKind {
    CreateEvent,
    SearchEvents,
    UpdateEvent,
    MoveEvent,
    DeleteEvent,
    ListCalendars,
}

impl CalendarToolKind {
    pub const ALL: [CalendarToolKind; 6] = [
        CalendarToolKind::CreateEvent,
        CalendarToolKind::SearchEvents,
        CalendarToolKind::UpdateEvent,
        CalendarToolKind::MoveEvent,
        CalendarToolKind::DeleteEvent,
        CalendarToolKind::ListCalendars,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CalendarToolKind::CreateEvent => CREATE_EVENT,
            CalendarToolKind::SearchEvents => SEARCH_EVENTS,
            CalendarToolKind::UpdateEvent => UPDATE_EVENT,
            CalendarToolKind::MoveEvent => MOVE_EVENT,
            CalendarToolKind::DeleteEvent => DELETE_EVENT,
            CalendarToolKind::ListCalendars => LIST_CALENDARS,
        }
    }

    pub fn spec(self) -> ToolSpec {
        match self {
            CalendarToolKind::CreateEvent => ToolSpec::new(
                CREATE_EVENT,
                "Create a new event on a calendar",
                json_schema_for::<CreateEventArgs>(),
            )
            .when_to_use("The user asks to add, book, block or schedule something new")
            .when_not_to_use(
                "The event already exists and only its time or details change; \
                 use update_calendar_event",
            )
            .example(
                "green event tomorrow 10:00-10:30 named Standup",
                "create_calendar_event(summary=\"Standup\", start_datetime=\"<tomorrow> 10:00\", \
                 end_datetime=\"<tomorrow> 10:30\", timezone=<user zone>, color_id=\"10\")",
            )
            .output_format("The created event resource (JSON), including its id and htmlLink"),
            CalendarToolKind::SearchEvents => ToolSpec::new(
                SEARCH_EVENTS,
                "Find events on one calendar by time range and/or text",
                json_schema_for::<SearchEventsArgs>(),
            )
            .when_to_use(
                "Checking availability, listing an agenda, or finding an event id \
                 before updating, moving or deleting it",
            )
            .when_not_to_use("Listing which calendars exist; use get_calendars_info")
            .output_format("Google events list (JSON); recurring events are expanded"),
            CalendarToolKind::UpdateEvent => ToolSpec::new(
                UPDATE_EVENT,
                "Change fields of an existing event; unspecified fields stay as they are",
                json_schema_for::<UpdateEventArgs>(),
            )
            .when_to_use("Rescheduling, renaming, recoloring or editing an event")
            .when_not_to_use(
                "Moving the event to a different calendar; use move_calendar_event",
            )
            .output_format("The updated event resource (JSON)"),
            CalendarToolKind::MoveEvent => ToolSpec::new(
                MOVE_EVENT,
                "Move an event to another calendar, keeping its time",
                json_schema_for::<MoveEventArgs>(),
            )
            .when_to_use("The user wants an event to belong to a different calendar")
            .when_not_to_use("Changing when the event happens; use update_calendar_event")
            .output_format("The moved event resource (JSON)"),
            CalendarToolKind::DeleteEvent => ToolSpec::new(
                DELETE_EVENT,
                "Delete an event",
                json_schema_for::<DeleteEventArgs>(),
            )
            .when_to_use("The user asks to cancel or remove an event")
            .when_not_to_use("Rescheduling; use update_calendar_event")
            .output_format("A short confirmation"),
            CalendarToolKind::ListCalendars => ToolSpec::new(
                LIST_CALENDARS,
                "List the user's calendars with their ids, names, time zones and access roles",
                json!({"type": "object", "properties": {}}),
            )
            .when_to_use(
                "You need a calendar id other than primary, or the user's default time zone",
            )
            .when_not_to_use("Looking for events; use search_events")
            .output_format("Google calendarList (JSON)"),
        }
    }

    /// Turn schema-checked arguments into a calendar request.
    pub fn build_request(self, args: Value) -> Result<CalendarRequest, ToolError> {
        let tool = self.name();
        match self {
            CalendarToolKind::CreateEvent => {
                let args: CreateEventArgs = parse_args(tool, args)?;
                create_request(tool, args)
            }
            CalendarToolKind::SearchEvents => {
                let args: SearchEventsArgs = parse_args(tool, args)?;
                search_request(tool, args)
            }
            CalendarToolKind::UpdateEvent => {
                let args: UpdateEventArgs = parse_args(tool, args)?;
                update_request(tool, args)
            }
            CalendarToolKind::MoveEvent => {
                let args: MoveEventArgs = parse_args(tool, args)?;
                Ok(CalendarRequest::MoveEvent {
                    source_calendar_id: required(tool, "source_calendar_id", args.source_calendar_id)?,
                    event_id: required(tool, "event_id", args.event_id)?,
                    destination_calendar_id: required(
                        tool,
                        "destination_calendar_id",
                        args.destination_calendar_id,
                    )?,
                })
            }
            CalendarToolKind::DeleteEvent => {
                let args: DeleteEventArgs = parse_args(tool, args)?;
                Ok(CalendarRequest::DeleteEvent {
                    calendar_id: required(tool, "calendar_id", args.calendar_id)?,
                    event_id: required(tool, "event_id", args.event_id)?,
                })
            }
            CalendarToolKind::ListCalendars => Ok(CalendarRequest::ListCalendars),
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

fn required(tool: &str, field: &str, value: String) -> Result<String, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ToolError::invalid(tool, format!("{field} must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Drop blank optional strings so they don't end up in the payload.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn attendee_list(tool: &str, emails: Option<Vec<String>>) -> Result<Option<Vec<Attendee>>, ToolError> {
    let Some(emails) = emails else {
        return Ok(None);
    };
    emails
        .into_iter()
        .map(|email| {
            let email = email.trim().to_string();
            if email.contains('@') {
                Ok(Attendee { email })
            } else {
                Err(ToolError::invalid(
                    tool,
                    format!("attendee '{email}' is not an email address"),
                ))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn check_order(tool: &str, start: &str, end: &str) -> Result<(), ToolError> {
    let start = parse_naive_datetime(start).map_err(|e| ToolError::invalid(tool, e))?;
    let end = parse_naive_datetime(end).map_err(|e| ToolError::invalid(tool, e))?;
    if end <= start {
        return Err(ToolError::invalid(
            tool,
            "end_datetime must be after start_datetime",
        ));
    }
    Ok(())
}

fn create_request(tool: &str, args: CreateEventArgs) -> Result<CalendarRequest, ToolError> {
    let summary = required(tool, "summary", args.summary)?;
    check_order(tool, &args.start_datetime, &args.end_datetime)?;
    let start =
        event_time(&args.start_datetime, &args.timezone).map_err(|e| ToolError::invalid(tool, e))?;
    let end =
        event_time(&args.end_datetime, &args.timezone).map_err(|e| ToolError::invalid(tool, e))?;

    Ok(CalendarRequest::CreateEvent {
        calendar_id: required(tool, "calendar_id", args.calendar_id)?,
        event: EventPayload {
            summary: Some(summary),
            description: non_blank(args.description),
            location: non_blank(args.location),
            start: Some(start),
            end: Some(end),
            color_id: args.color_id.map(|c| c.as_str().to_string()),
            attendees: attendee_list(tool, args.attendees)?,
            transparency: args.transparency.map(|t| t.as_str().to_string()),
            recurrence: args.recurrence.filter(|r| !r.is_empty()),
        },
    })
}

fn search_request(tool: &str, args: SearchEventsArgs) -> Result<CalendarRequest, ToolError> {
    if !(1..=MAX_SEARCH_RESULTS).contains(&args.max_results) {
        return Err(ToolError::invalid(
            tool,
            format!("max_results must be between 1 and {MAX_SEARCH_RESULTS}"),
        ));
    }
    let tz = parse_timezone(args.timezone.as_deref().unwrap_or("UTC"))
        .map_err(|e| ToolError::invalid(tool, e))?;
    let bound = |value: Option<String>| -> Result<Option<String>, ToolError> {
        non_blank(value)
            .map(|v| to_rfc3339(&v, tz).map_err(|e| ToolError::invalid(tool, e)))
            .transpose()
    };

    Ok(CalendarRequest::SearchEvents(EventQuery {
        calendar_id: required(tool, "calendar_id", args.calendar_id)?,
        time_min: bound(args.min_datetime)?,
        time_max: bound(args.max_datetime)?,
        query: non_blank(args.query),
        max_results: args.max_results,
    }))
}

fn update_request(tool: &str, args: UpdateEventArgs) -> Result<CalendarRequest, ToolError> {
    let retimed = args.start_datetime.is_some() || args.end_datetime.is_some();
    let timezone = match (&args.timezone, retimed) {
        (Some(tz), _) => Some(tz.clone()),
        (None, true) => {
            return Err(ToolError::invalid(
                tool,
                "timezone is required when changing start_datetime or end_datetime",
            ));
        }
        (None, false) => None,
    };
    if let (Some(start), Some(end)) = (&args.start_datetime, &args.end_datetime) {
        check_order(tool, start, end)?;
    }
    let time = |value: &Option<String>| -> Result<Option<_>, ToolError> {
        match (value, &timezone) {
            (Some(v), Some(tz)) => event_time(v, tz)
                .map(Some)
                .map_err(|e| ToolError::invalid(tool, e)),
            _ => Ok(None),
        }
    };

    let patch = EventPayload {
        summary: non_blank(args.summary),
        description: args.description,
        location: args.location,
        start: time(&args.start_datetime)?,
        end: time(&args.end_datetime)?,
        color_id: args.color_id.map(|c| c.as_str().to_string()),
        attendees: attendee_list(tool, args.attendees)?,
        transparency: args.transparency.map(|t| t.as_str().to_string()),
        recurrence: None,
    };
    if patch.is_empty() {
        return Err(ToolError::invalid(tool, "no fields to update were given"));
    }

    Ok(CalendarRequest::UpdateEvent {
        calendar_id: required(tool, "calendar_id", args.calendar_id)?,
        event_id: required(tool, "event_id", args.event_id)?,
        patch,
    })
}

// ── Tool implementation ─────────────────────────────────────────────

/// One calendar tool bound to a service.
pub struct CalendarTool {
    kind: CalendarToolKind,
    service: Arc<dyn CalendarService>,
}

impl CalendarTool {
    pub fn new(kind: CalendarToolKind, service: Arc<dyn CalendarService>) -> Self {
        Self { kind, service }
    }

    pub fn kind(&self) -> CalendarToolKind {
        self.kind
    }
}

impl Tool for CalendarTool {
    fn definition(&self) -> ToolDef {
        self.kind.spec().to_tool_def()
    }

    fn name(&self) -> String {
        self.kind.name().to_string()
    }

    fn invoke(&self, arguments: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let request = self.kind.build_request(arguments)?;
            debug!("Calendar {} request via {}", request.operation(), self.kind.name());
            self.service
                .call(request)
                .await
                .map_err(|e| ToolError::ExecutionFailure {
                    tool: self.kind.name().to_string(),
                    payload: e.payload(),
                })
        })
    }
}

// ── Extension trait ─────────────────────────────────────────────────

/// Extension trait for registering the calendar tools on a
/// [`ToolRegistry`].
///
/// ```ignore
/// let tools = ToolRegistry::new().with_calendar_tools(Arc::new(client))?;
/// ```
pub trait CalendarToolsExt: Sized {
    fn with_calendar_tools(self, service: Arc<dyn CalendarService>) -> Result<Self, RegistryError>;
}

impl CalendarToolsExt for ToolRegistry {
    fn with_calendar_tools(
        mut self,
        service: Arc<dyn CalendarService>,
    ) -> Result<Self, RegistryError> {
        for kind in CalendarToolKind::ALL {
            self.register(CalendarTool::new(kind, service.clone()))?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarFuture;
    use crate::error::CalendarError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<CalendarRequest>>,
        reject_with: Option<CalendarError>,
    }

    impl CalendarService for Recorder {
        fn call(&self, request: CalendarRequest) -> CalendarFuture<'_> {
            self.requests.lock().unwrap().push(request);
            let reply = match &self.reject_with {
                Some(err) => Err(err.clone()),
                None => Ok(json!({"id": "evt_1", "status": "confirmed"})),
            };
            Box::pin(async move { reply })
        }
    }

    fn registry(service: Arc<Recorder>) -> ToolRegistry {
        ToolRegistry::new().with_calendar_tools(service).unwrap()
    }

    #[test]
    fn registers_all_six_tools() {
        let reg = registry(Arc::new(Recorder::default()));
        assert_eq!(
            reg.names(),
            vec![
                CREATE_EVENT,
                SEARCH_EVENTS,
                UPDATE_EVENT,
                MOVE_EVENT,
                DELETE_EVENT,
                LIST_CALENDARS
            ]
        );
    }

    #[test]
    fn registering_twice_is_a_duplicate() {
        let service: Arc<dyn CalendarService> = Arc::new(Recorder::default());
        let err = ToolRegistry::new()
            .with_calendar_tools(service.clone())
            .and_then(|r| r.with_calendar_tools(service))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateToolName(CREATE_EVENT.into()));
    }

    #[test]
    fn color_schema_is_a_closed_enumeration() {
        let schema = CalendarToolKind::CreateEvent.spec().parameters.to_string();
        assert!(schema.contains("\"11\""));
        assert!(!schema.contains("$ref"));
    }

    #[tokio::test]
    async fn create_sends_one_request_and_returns_result_verbatim() {
        let service = Arc::new(Recorder::default());
        let reg = registry(service.clone());
        let result = reg
            .invoke(
                CREATE_EVENT,
                r#"{"summary":"Standup","start_datetime":"2025-03-05 10:00",
                    "end_datetime":"2025-03-05 10:30","timezone":"Europe/Istanbul","color_id":"10"}"#,
            )
            .await
            .unwrap();
        assert_eq!(result, json!({"id": "evt_1", "status": "confirmed"}));

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let CalendarRequest::CreateEvent { calendar_id, event } = &requests[0] else {
            panic!("expected create, got {:?}", requests[0]);
        };
        assert_eq!(calendar_id, "primary");
        assert_eq!(event.summary.as_deref(), Some("Standup"));
        assert_eq!(event.color_id.as_deref(), Some("10"));
        assert_eq!(event.start.as_ref().unwrap().date_time, "2025-03-05T10:00:00");
        assert_eq!(event.end.as_ref().unwrap().time_zone, "Europe/Istanbul");
    }

    #[tokio::test]
    async fn explicit_null_optionals_are_accepted() {
        let service = Arc::new(Recorder::default());
        let reg = registry(service.clone());
        reg.invoke(
            CREATE_EVENT,
            r#"{"summary":"Standup","start_datetime":"2025-03-05 10:00",
                "end_datetime":"2025-03-05 10:30","timezone":"UTC",
                "color_id":null,"transparency":null,"location":null}"#,
        )
        .await
        .unwrap();

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let CalendarRequest::CreateEvent { event, .. } = &requests[0] else {
            panic!("expected create, got {:?}", requests[0]);
        };
        assert!(event.color_id.is_none());
        assert!(event.transparency.is_none());
    }

    #[tokio::test]
    async fn update_accepts_null_color() {
        let service = Arc::new(Recorder::default());
        let reg = registry(service.clone());
        reg.invoke(UPDATE_EVENT, r#"{"event_id":"evt_1","summary":"Renamed","color_id":null}"#)
            .await
            .unwrap();
        assert_eq!(service.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn out_of_range_color_is_invalid_and_makes_no_call() {
        let service = Arc::new(Recorder::default());
        let reg = registry(service.clone());
        let err = reg
            .invoke(
                CREATE_EVENT,
                r#"{"summary":"x","start_datetime":"2025-03-05 10:00",
                    "end_datetime":"2025-03-05 10:30","timezone":"UTC","color_id":"12"}"#,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref tool, .. } if tool == CREATE_EVENT));
        assert!(service.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_before_start_is_invalid() {
        let service = Arc::new(Recorder::default());
        let reg = registry(service.clone());
        let err = reg
            .invoke(
                CREATE_EVENT,
                r#"{"summary":"x","start_datetime":"2025-03-05 10:30",
                    "end_datetime":"2025-03-05 10:00","timezone":"UTC"}"#,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("end_datetime must be after"));
        assert!(service.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_timezone_is_invalid() {
        let reg = registry(Arc::new(Recorder::default()));
        let err = reg
            .invoke(
                CREATE_EVENT,
                r#"{"summary":"x","start_datetime":"2025-03-05 10:00",
                    "end_datetime":"2025-03-05 11:00","timezone":"Atlantis/Capital"}"#,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn service_rejection_passes_payload_through() {
        let body = r#"{"error":{"code":403,"message":"Forbidden"}}"#;
        let service = Arc::new(Recorder {
            reject_with: Some(CalendarError::Rejected {
                status: 403,
                body: body.into(),
            }),
            ..Default::default()
        });
        let reg = registry(service);
        let err = reg
            .invoke(DELETE_EVENT, r#"{"event_id":"evt_1"}"#)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::ExecutionFailure {
                tool: DELETE_EVENT.into(),
                payload: body.into()
            }
        );
    }

    #[test]
    fn search_bounds_resolve_in_timezone() {
        let request = CalendarToolKind::SearchEvents
            .build_request(json!({
                "min_datetime": "2025-03-05 00:00",
                "max_datetime": "2025-03-06T00:00:00Z",
                "timezone": "Europe/Istanbul",
                "query": "  "
            }))
            .unwrap();
        assert_eq!(
            request,
            CalendarRequest::SearchEvents(EventQuery {
                calendar_id: "primary".into(),
                time_min: Some("2025-03-05T00:00:00+03:00".into()),
                time_max: Some("2025-03-06T00:00:00+00:00".into()),
                query: None,
                max_results: 10,
            })
        );
    }

    #[test]
    fn search_rejects_out_of_range_limit() {
        let err = CalendarToolKind::SearchEvents
            .build_request(json!({"max_results": 0}))
            .unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn update_requires_a_change() {
        let err = CalendarToolKind::UpdateEvent
            .build_request(json!({"event_id": "evt_1"}))
            .unwrap_err();
        assert!(err.to_string().contains("no fields to update"));
    }

    #[test]
    fn update_with_new_time_requires_timezone() {
        let err = CalendarToolKind::UpdateEvent
            .build_request(json!({"event_id": "evt_1", "start_datetime": "2025-03-05 11:00"}))
            .unwrap_err();
        assert!(err.to_string().contains("timezone is required"));
    }

    #[test]
    fn update_builds_partial_patch() {
        let request = CalendarToolKind::UpdateEvent
            .build_request(json!({
                "event_id": "evt_1",
                "start_datetime": "2025-03-05 11:00",
                "end_datetime": "2025-03-05 11:30",
                "timezone": "UTC",
                "color_id": "11"
            }))
            .unwrap();
        let CalendarRequest::UpdateEvent { event_id, patch, .. } = request else {
            panic!("expected update");
        };
        assert_eq!(event_id, "evt_1");
        assert!(patch.summary.is_none());
        assert_eq!(patch.color_id.as_deref(), Some("11"));
        assert_eq!(patch.start.unwrap().time_zone, "Etc/UTC");
    }

    #[test]
    fn move_and_delete_default_to_primary() {
        assert_eq!(
            CalendarToolKind::MoveEvent
                .build_request(json!({"event_id": "e", "destination_calendar_id": "work"}))
                .unwrap(),
            CalendarRequest::MoveEvent {
                source_calendar_id: "primary".into(),
                event_id: "e".into(),
                destination_calendar_id: "work".into(),
            }
        );
        assert_eq!(
            CalendarToolKind::DeleteEvent
                .build_request(json!({"event_id": "e"}))
                .unwrap(),
            CalendarRequest::DeleteEvent {
                calendar_id: "primary".into(),
                event_id: "e".into(),
            }
        );
    }

    #[test]
    fn attendees_must_be_emails() {
        let err = CalendarToolKind::CreateEvent
            .build_request(json!({
                "summary": "Sync",
                "start_datetime": "2025-03-05 10:00",
                "end_datetime": "2025-03-05 10:30",
                "timezone": "UTC",
                "attendees": ["bob"]
            }))
            .unwrap_err();
        assert!(err.to_string().contains("not an email"));
    }

    #[test]
    fn color_ids_cover_the_palette() {
        let ids: Vec<&str> = ColorId::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(ids.first(), Some(&"1"));
        assert_eq!(ids.last(), Some(&"11"));
        assert_eq!(ColorId::Basil.label(), "Basil");
        let parsed: ColorId = serde_json::from_value(json!("10")).unwrap();
        assert_eq!(parsed, ColorId::Basil);
    }
}
