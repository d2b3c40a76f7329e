//! One-shot commands that call the tools directly, without a session.

use anyhow::Context;
use serde_json::{Map, Value, json};
use std::path::Path;
use tempo::calendar::CalendarToolKind;
use tempo::calendar::tools::{CREATE_EVENT, LIST_CALENDARS};
use tempo::tools::ToolRegistry;

use crate::config::{AgentConfig, GEMINI_MODEL, GOOGLE_API_KEY};
use crate::envfile;
use crate::render::{panel, secret_status, table};

/// Rows for the `tools` command: name and purpose of each calendar tool.
pub fn tool_rows() -> Vec<Vec<String>> {
    CalendarToolKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let spec = kind.spec();
            vec![(i + 1).to_string(), spec.name, spec.purpose]
        })
        .collect()
}

/// Fields of `quick-create`.
#[derive(Debug, Clone, Default)]
pub struct QuickCreate {
    pub summary: String,
    pub start: String,
    pub end: String,
    pub timezone: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub color_id: Option<String>,
}

impl QuickCreate {
    /// Arguments for `create_calendar_event`. Blank optionals are left out.
    pub fn to_arguments(&self) -> Value {
        let mut args = Map::new();
        args.insert("summary".into(), json!(self.summary));
        args.insert("start_datetime".into(), json!(self.start));
        args.insert("end_datetime".into(), json!(self.end));
        args.insert("timezone".into(), json!(self.timezone));
        let optional = [
            ("location", &self.location),
            ("description", &self.description),
            ("color_id", &self.color_id),
        ];
        for (key, value) in optional {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                args.insert(key.into(), json!(v));
            }
        }
        Value::Object(args)
    }
}

/// Create one event through the registry, with the same validation the
/// agent gets. Returns the rendered result.
pub async fn quick_create(tools: &ToolRegistry, event: &QuickCreate) -> anyhow::Result<String> {
    let args = event.to_arguments().to_string();
    let created = tools
        .invoke(CREATE_EVENT, &args)
        .await
        .context("could not create the event")?;
    let body = serde_json::to_string_pretty(&created).context("failed to render the result")?;
    Ok(panel("Create Event", &body))
}

/// Summary and id of each calendar in a `calendarList` response. Accepts
/// either the `{ "items": [...] }` envelope or a bare array.
pub fn calendar_rows(data: &Value) -> Option<Vec<Vec<String>>> {
    let items = data
        .get("items")
        .and_then(Value::as_array)
        .or_else(|| data.as_array())?;
    let field = |cal: &Value, key: &str| {
        cal.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(
        items
            .iter()
            .map(|cal| vec![field(cal, "summary"), field(cal, "id")])
            .collect(),
    )
}

pub async fn list_calendars(tools: &ToolRegistry) -> anyhow::Result<String> {
    let data = tools
        .invoke(LIST_CALENDARS, "{}")
        .await
        .context("could not list calendars")?;
    let rows = calendar_rows(&data)
        .unwrap_or_else(|| vec![vec!["(unparsed)".to_string(), data.to_string()]]);
    Ok(table("Calendars", &["Summary", "ID"], &rows))
}

pub fn env_info(config: &AgentConfig) -> String {
    table("Environment", &["Key", "Value"], &config.env_rows())
}

/// Persist the runtime key and model to the `.env` at `path`. Returns the
/// confirmation table.
pub fn configure_google(path: &Path, api_key: Option<&str>, model: &str) -> anyhow::Result<String> {
    let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());
    let model = model.trim();

    let mut entries = Vec::new();
    if let Some(key) = api_key {
        entries.push((GOOGLE_API_KEY, key));
    }
    if !model.is_empty() {
        entries.push((GEMINI_MODEL, model));
    }
    envfile::upsert(path, &entries)?;

    let rows = vec![
        vec![GOOGLE_API_KEY.to_string(), secret_status(api_key)],
        vec![
            GEMINI_MODEL.to_string(),
            if model.is_empty() { "-".to_string() } else { model.to_string() },
        ],
    ];
    Ok(panel(
        &format!("Saved to {}", path.display()),
        &table("Google config", &["Key", "Value"], &rows),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempo::calendar::{CalendarFuture, CalendarRequest, CalendarService, CalendarToolsExt};

    struct FakeCalendar {
        requests: Mutex<Vec<CalendarRequest>>,
        reply: Value,
    }

    impl CalendarService for FakeCalendar {
        fn call(&self, request: CalendarRequest) -> CalendarFuture<'_> {
            self.requests.lock().unwrap().push(request);
            let reply = self.reply.clone();
            Box::pin(async move { Ok(reply) })
        }
    }

    fn registry(reply: Value) -> (Arc<FakeCalendar>, ToolRegistry) {
        let calendar = Arc::new(FakeCalendar {
            requests: Mutex::new(Vec::new()),
            reply,
        });
        let service: Arc<dyn CalendarService> = calendar.clone();
        (calendar, ToolRegistry::new().with_calendar_tools(service).unwrap())
    }

    fn standup() -> QuickCreate {
        QuickCreate {
            summary: "Standup".into(),
            start: "2025-03-05 10:00".into(),
            end: "2025-03-05 10:30".into(),
            timezone: "Europe/Istanbul".into(),
            color_id: Some("10".into()),
            location: Some("  ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn tool_rows_list_all_tools() {
        let rows = tool_rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0][0], "1");
        assert_eq!(rows[0][1], CREATE_EVENT);
        assert_eq!(rows[5][1], LIST_CALENDARS);
    }

    #[test]
    fn quick_create_arguments_skip_blank_optionals() {
        let args = standup().to_arguments();
        assert_eq!(args["color_id"], "10");
        assert!(args.get("location").is_none());
        assert!(args.get("description").is_none());
    }

    #[tokio::test]
    async fn quick_create_sends_one_request() {
        let (calendar, tools) = registry(json!({"id": "evt_1"}));
        let out = quick_create(&tools, &standup()).await.unwrap();
        assert!(out.contains("Create Event"));
        assert!(out.contains("evt_1"));
        assert_eq!(calendar.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn quick_create_rejects_bad_color_before_calling_the_calendar() {
        let (calendar, tools) = registry(json!({}));
        let event = QuickCreate {
            color_id: Some("99".into()),
            ..standup()
        };
        assert!(quick_create(&tools, &event).await.is_err());
        assert!(calendar.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_calendars_renders_items() {
        let (_, tools) = registry(json!({"items": [
            {"id": "primary", "summary": "Me"},
            {"id": "work@example.com", "summary": "Work"}
        ]}));
        let out = list_calendars(&tools).await.unwrap();
        assert!(out.contains("│ Work    │ work@example.com │"), "{out}");
    }

    #[test]
    fn calendar_rows_accepts_bare_arrays_and_rejects_others() {
        let rows = calendar_rows(&json!([{"id": "a"}])).unwrap();
        assert_eq!(rows, vec![vec![String::new(), "a".to_string()]]);
        assert!(calendar_rows(&json!("nope")).is_none());
    }

    #[test]
    fn configure_google_writes_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "KEEP=1\n").unwrap();
        let out = configure_google(&path, Some("sk-secret-value"), "gemini-2.5-flash").unwrap();
        assert!(out.contains("SET"));
        assert!(!out.contains("sk-secret-value"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "KEEP=1\nGOOGLE_API_KEY=sk-secret-value\nGEMINI_MODEL=gemini-2.5-flash\n"
        );
    }

    #[test]
    fn env_info_lists_keys() {
        let config = AgentConfig::from_lookup(|_| None);
        let out = env_info(&config);
        assert!(out.contains(GOOGLE_API_KEY));
        assert!(out.contains("Etc/UTC"));
    }
}
