//! Google Calendar v3 REST client.
//!
//! Authentication is a bearer access token supplied by the host; obtaining
//! and refreshing it is not this client's concern.

use super::{CalendarFuture, CalendarRequest, CalendarService};
use crate::error::CalendarError;
use reqwest::{Method, Url};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub const GOOGLE_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// A request in HTTP terms.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCall {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

/// Async client for the Google Calendar API.
pub struct GoogleCalendarClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self, CalendarError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tempo/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CalendarError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: GOOGLE_CALENDAR_BASE_URL.to_string(),
            access_token: access_token.into(),
        })
    }

    /// Override the API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send(&self, call: HttpCall) -> Result<Value, CalendarError> {
        debug!("Calendar API {} {}", call.method, call.url.path());
        if let Some(body) = &call.body {
            trace!("Calendar API body: {body}");
        }
        let start = Instant::now();

        let mut builder = self
            .client
            .request(call.method, call.url)
            .bearer_auth(&self.access_token);
        if let Some(body) = &call.body {
            builder = builder.json(body);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CalendarError::Transport(format!("failed to read response: {e}")))?;
        debug!(
            "Calendar API response: HTTP {} in {:.0}ms ({} bytes)",
            status,
            start.elapsed().as_secs_f64() * 1000.0,
            text.len()
        );

        interpret_response(status.as_u16(), text)
    }
}

impl CalendarService for GoogleCalendarClient {
    fn call(&self, request: CalendarRequest) -> CalendarFuture<'_> {
        Box::pin(async move {
            let call = build_http_call(&self.base_url, &request)?;
            self.send(call).await
        })
    }
}

/// Map a calendar request to method, URL and body.
pub fn build_http_call(base_url: &str, request: &CalendarRequest) -> Result<HttpCall, CalendarError> {
    let url = |segments: &[&str], query: &[(&str, String)]| -> Result<Url, CalendarError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| CalendarError::InvalidRequest(format!("bad base URL '{base_url}': {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::InvalidRequest(format!("base URL '{base_url}' cannot have a path")))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    };
    let to_body = |payload: &super::EventPayload| {
        serde_json::to_value(payload).map_err(|e| CalendarError::InvalidRequest(e.to_string()))
    };

    let call = match request {
        CalendarRequest::CreateEvent { calendar_id, event } => HttpCall {
            method: Method::POST,
            url: url(&["calendars", calendar_id.as_str(), "events"], &[])?,
            body: Some(to_body(event)?),
        },
        CalendarRequest::SearchEvents(q) => {
            let mut query = vec![
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", q.max_results.to_string()),
            ];
            if let Some(min) = &q.time_min {
                query.push(("timeMin", min.clone()));
            }
            if let Some(max) = &q.time_max {
                query.push(("timeMax", max.clone()));
            }
            if let Some(text) = &q.query {
                query.push(("q", text.clone()));
            }
            HttpCall {
                method: Method::GET,
                url: url(&["calendars", q.calendar_id.as_str(), "events"], &query)?,
                body: None,
            }
        }
        CalendarRequest::UpdateEvent {
            calendar_id,
            event_id,
            patch,
        } => HttpCall {
            method: Method::PATCH,
            url: url(&["calendars", calendar_id.as_str(), "events", event_id.as_str()], &[])?,
            body: Some(to_body(patch)?),
        },
        CalendarRequest::MoveEvent {
            source_calendar_id,
            event_id,
            destination_calendar_id,
        } => HttpCall {
            method: Method::POST,
            url: url(
                &["calendars", source_calendar_id.as_str(), "events", event_id.as_str(), "move"],
                &[("destination", destination_calendar_id.clone())],
            )?,
            body: None,
        },
        CalendarRequest::DeleteEvent {
            calendar_id,
            event_id,
        } => HttpCall {
            method: Method::DELETE,
            url: url(&["calendars", calendar_id.as_str(), "events", event_id.as_str()], &[])?,
            body: None,
        },
        CalendarRequest::ListCalendars => HttpCall {
            method: Method::GET,
            url: url(&["users", "me", "calendarList"], &[])?,
            body: None,
        },
    };
    Ok(call)
}

/// Turn a status and body into the tool result. Success bodies are returned
/// as parsed JSON (or as a JSON string when not JSON); an empty success body
/// becomes `null`. Failures keep the body verbatim.
pub fn interpret_response(status: u16, text: String) -> Result<Value, CalendarError> {
    if !(200..300).contains(&status) {
        return Err(CalendarError::Rejected { status, body: text });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!(text)))
}
