//! Error taxonomy.
//!
//! Tool-level errors ([`ToolError`]) are recovered inside a turn: the session
//! turns them into tool-result content so the model can react. Runtime-level
//! errors ([`RuntimeError`]) abort only the current turn. A
//! [`RegistryError`] is raised while building the registry and prevents the
//! session from starting.

use thiserror::Error;

/// Failure of a single tool invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The calendar service rejected or failed the call. `payload` is the
    /// service's response, verbatim.
    #[error("tool '{tool}' failed: {payload}")]
    ExecutionFailure { tool: String, payload: String },
}

impl ToolError {
    pub fn invalid(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Render the error as tool-result content for the model.
    pub fn to_tool_content(&self) -> String {
        match self {
            ToolError::UnknownTool(_) => format!(
                "Error: {self}. Only the tools listed in this conversation are available."
            ),
            ToolError::InvalidArguments { .. } => format!(
                "Error: {self}\nPlease fix the arguments and try again."
            ),
            ToolError::ExecutionFailure { .. } => format!("Error: {self}"),
        }
    }
}

/// Failure while building a [`ToolRegistry`](crate::tools::core::ToolRegistry).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate tool name '{0}'")]
    DuplicateToolName(String),
}

/// Failure of the agent runtime: unreachable, rejected the request, or
/// returned something the session cannot act on.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("runtime API HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("runtime API error: {0}")]
    Api(String),

    #[error("malformed runtime response: {0}")]
    Malformed(String),

    #[error("runtime returned neither text nor tool calls")]
    Empty,

    #[error("no final answer after {0} rounds")]
    RoundLimit(u32),
}

impl RuntimeError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RuntimeError::Transport(_) => true,
            RuntimeError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Failure reported by a [`CalendarService`](crate::calendar::CalendarService).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Non-success HTTP status; `body` is the service's payload.
    #[error("calendar API HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("calendar request failed: {0}")]
    Transport(String),

    #[error("invalid calendar request: {0}")]
    InvalidRequest(String),
}

impl CalendarError {
    /// The text handed back to the model. Rejections pass the service's
    /// payload through untouched.
    pub fn payload(&self) -> String {
        match self {
            CalendarError::Rejected { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Violation of the message-log invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("tool result without a tool_call_id")]
    MissingToolCallId,

    #[error("tool result for call '{0}' that was never issued")]
    UnknownToolCallId(String),

    #[error("tool call '{0}' already has a result")]
    DuplicateToolResult(String),

    #[error("tool call id '{0}' was issued more than once")]
    DuplicateToolCallId(String),

    #[error("tool call(s) left without a result: {0}")]
    UnansweredToolCalls(String),
}

impl From<HistoryError> for RuntimeError {
    fn from(e: HistoryError) -> Self {
        RuntimeError::Malformed(e.to_string())
    }
}
