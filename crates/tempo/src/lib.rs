//! Conversational calendar agent core.
//!
//! `tempo` lets a language model manage a Google Calendar through a fixed
//! set of tools. The host (usually the `tempo` CLI) composes a system prompt,
//! builds a [`ToolRegistry`](tools::core::ToolRegistry) of calendar tools and
//! hands both to a [`ConversationSession`](agent::session::ConversationSession),
//! which drives the tool-calling loop one user turn at a time.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tempo::prelude::*;
//!
//! let calendar = Arc::new(GoogleCalendarClient::new(access_token)?);
//! let tools = ToolRegistry::new().with_calendar_tools(calendar)?;
//! let runtime = ChatRuntime::new(ChatClient::new(api_key)?, RuntimeConfig::default());
//!
//! let system = PromptComposer::new().compose(&now_local, &now_utc, prefs.as_ref(), None);
//! let mut session = ConversationSession::new(&runtime, &tools, system)
//!     .with_event_handler(&LoggingHandler);
//! let outcome = session.submit("Create event Standup tomorrow 10:00-10:30").await?;
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | Session state machine, message log, runtime boundary, prompt composition, preferences, events |
//! | [`tools`] | [`Tool`](tools::core::Tool) trait, [`ToolRegistry`](tools::core::ToolRegistry), structured tool descriptions |
//! | [`calendar`] | Calendar service boundary, the six calendar tools, Google Calendar REST client |
//! | [`api`] | Retry with backoff for runtime calls |
//! | [`error`] | Error taxonomy shared by the modules above |

pub mod agent;
pub mod api;
pub mod calendar;
pub mod error;
pub mod prelude;
pub mod tools;

use error::RuntimeError;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// Re-export schemars for downstream crates.
pub use schemars;

// ── Constants ──────────────────────────────────────────────────────

/// Gemini's OpenAI-compatible chat completions endpoint.
pub const GEMINI_OPENAI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";

/// Default model for agent turns.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// Subschemas are inlined and the `$schema` marker is dropped, so the result
/// contains no `$ref`/`definitions` indirection. Several OpenAI-compatible
/// endpoints (Gemini's among them) reject referenced schemas in tool
/// parameters.
///
/// # Example
///
/// ```
/// use tempo::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct DeleteArgs {
///     event_id: String,
///     #[serde(default)]
///     calendar_id: Option<String>,
/// }
///
/// let schema = json_schema_for::<DeleteArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"event_id".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let mut value = serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("definitions");
    }
    allow_null_in_enums(&mut value);
    value
}

/// Optional enums come out as `"type": [.., "null"]` with an `enum` list
/// that lacks `null`, so a validator would reject the default. Add it.
fn allow_null_in_enums(schema: &mut serde_json::Value) {
    use serde_json::Value;
    let Value::Object(obj) = schema else {
        return;
    };
    let nullable = match obj.get("type") {
        Some(Value::Array(types)) => types.iter().any(|t| t == "null"),
        Some(t) => t == "null",
        None => false,
    };
    if nullable
        && let Some(Value::Array(variants)) = obj.get_mut("enum")
        && !variants.contains(&Value::Null)
    {
        variants.push(Value::Null);
    }
    for child in obj.values_mut() {
        match child {
            Value::Object(_) => allow_null_in_enums(child),
            Value::Array(items) => items.iter_mut().for_each(allow_null_in_enums),
            _ => {}
        }
    }
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body in the OpenAI-compatible format. Unused
/// optional fields are omitted from serialization.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,

    // Generation parameters
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDef>>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// An assistant message requesting tool calls, optionally with the text
    /// the model produced alongside them.
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    /// Tool calls carried by this message (empty for anything but an
    /// assistant message that requests action).
    pub fn calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }

    /// Text content, or `""` when the message carries only metadata.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

// ── Tool types ─────────────────────────────────────────────────────

/// The type of a tool definition. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ToolType {
    #[serde(rename = "function")]
    Function,
}

/// Tool definition sent to the API (OpenAI function-calling format).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: FunctionDef,
}

impl ToolDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The type of a tool call. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum CallType {
    #[serde(rename = "function")]
    Function,
}

/// A tool call returned by the model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub function: FunctionCallData,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: CallType::Function,
            function: FunctionCallData {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionCallData {
    pub name: String,
    /// JSON-encoded arguments object.
    pub arguments: String,
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`ChatClient::chat`].
#[derive(Debug, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl ChatClient {
    /// Create a client for Gemini's OpenAI-compatible endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, RuntimeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tempo/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| RuntimeError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: GEMINI_OPENAI_URL.to_string(),
        })
    }

    /// Point the client at a different chat completions URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, RuntimeError> {
        let tool_count = body.tools.as_ref().map_or(0, |t| t.len());
        debug!(
            "LLM request: model={}, messages={}, tools={}, max_tokens={}",
            body.model,
            body.messages.len(),
            tool_count,
            body.max_tokens,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| RuntimeError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| RuntimeError::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(RuntimeError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }
}

/// Decode a chat completions response body.
fn parse_completion(text: &str) -> Result<ChatCompletion, RuntimeError> {
    let parsed: RawChatResponse = serde_json::from_str(text)
        .map_err(|e| RuntimeError::Malformed(format!("failed to parse response: {e}")))?;

    if let Some(err) = parsed.error {
        return Err(RuntimeError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let Some(choice) = parsed.choices.and_then(|c| c.into_iter().next()) else {
        debug!("LLM output: empty (no choices)");
        return Err(RuntimeError::Empty);
    };

    let tool_calls = choice.message.tool_calls.unwrap_or_default();
    debug!(
        "LLM output: {} chars text, {} tool call(s)",
        choice.message.content.as_ref().map_or(0, |s| s.len()),
        tool_calls.len()
    );

    Ok(ChatCompletion {
        content: choice.message.content,
        tool_calls,
        usage: parsed.usage,
        finish_reason: choice.finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_enum_schema_admits_null() {
        #[allow(dead_code)]
        #[derive(JsonSchema)]
        enum Shade {
            Light,
            Dark,
        }
        #[allow(dead_code)]
        #[derive(JsonSchema)]
        struct Args {
            required: Shade,
            #[serde(default)]
            optional: Option<Shade>,
        }
        let schema = json_schema_for::<Args>();
        let props = &schema["properties"];
        assert!(props["optional"]["enum"].as_array().unwrap().contains(&serde_json::Value::Null));
        assert!(!props["required"]["enum"].as_array().unwrap().contains(&serde_json::Value::Null));
    }

    #[test]
    fn request_omits_unset_fields() {
        let req = ChatRequest {
            model: DEFAULT_MODEL.into(),
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gemini-2.5-flash");
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn tool_result_message_serializes_call_id() {
        let msg = Message::tool_result("call_1", "{\"id\":\"evt\"}");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn assistant_tool_call_message_may_have_no_content() {
        let call = ToolCall::function("c1", "get_calendars_info", "{}");
        let msg = Message::assistant_tool_calls(None, vec![call]);
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["tool_calls"][0]["type"], "function");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "get_calendars_info");
        assert_eq!(msg.text(), "");
    }

    #[test]
    fn schema_has_no_references() {
        #[allow(dead_code)]
        #[derive(Deserialize, JsonSchema)]
        enum Shade {
            Light,
            Dark,
        }
        #[allow(dead_code)]
        #[derive(Deserialize, JsonSchema)]
        struct Args {
            shade: Shade,
            other: Option<Shade>,
        }

        let schema = json_schema_for::<Args>();
        let text = schema.to_string();
        assert!(!text.contains("$ref"), "{text}");
        assert!(schema.get("definitions").is_none());
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn parse_completion_with_tool_calls() {
        let body = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_a",
                        "type": "function",
                        "function": {"name": "search_events", "arguments": "{}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;
        let completion = parse_completion(body).unwrap();
        assert!(completion.content.is_none());
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].function.name, "search_events");
        assert_eq!(completion.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn parse_completion_surfaces_api_error() {
        let err = parse_completion(r#"{"error": {"message": "quota"}}"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Api(ref m) if m == "quota"));
    }

    #[test]
    fn parse_completion_rejects_garbage() {
        let err = parse_completion("<html>").unwrap_err();
        assert!(matches!(err, RuntimeError::Malformed(_)));
    }

    #[test]
    fn parse_completion_without_choices_is_empty() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Empty));
    }
}
