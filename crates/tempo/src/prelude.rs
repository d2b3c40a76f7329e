//! Convenience re-exports for hosts.
//!
//! ```ignore
//! use tempo::prelude::*;
//! ```
//!
//! Covers building a registry of calendar tools, composing the system prompt
//! and running a session. Wire types for the Google API and retry tuning are
//! left in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{ChatClient, Message, MessageRole, ToolCall, ToolDef, json_schema_for};

// ── Agent ───────────────────────────────────────────────────────────
pub use crate::agent::{
    AgentReply, AgentRuntime, ChatRuntime, CompositeEventHandler, ConversationSession,
    EventHandler, FnEventHandler, HistoryWindow, LoggingHandler, NoopHandler, PromptComposer,
    RuntimeConfig, SessionConfig, SessionEvent, SessionState, SubmitOutcome, TurnReport,
    UserPreferences, is_exit_command,
};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::{Tool, ToolFuture, ToolOutcome, ToolRegistry, ToolSpec};

// ── Calendar ────────────────────────────────────────────────────────
pub use crate::calendar::{
    CalendarService, CalendarToolKind, CalendarToolsExt, GoogleCalendarClient,
};

// ── Errors ──────────────────────────────────────────────────────────
pub use crate::error::{CalendarError, RegistryError, RuntimeError, ToolError};
