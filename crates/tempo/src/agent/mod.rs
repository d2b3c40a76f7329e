//! Conversation layer: the session state machine and what feeds it.
//!
//! - [`session`]: [`ConversationSession`](session::ConversationSession), the
//!   per-turn tool-calling loop.
//! - [`history`]: append-only [`ConversationLog`](history::ConversationLog)
//!   and [`HistoryWindow`](history::HistoryWindow).
//! - [`runtime`]: the [`AgentRuntime`](runtime::AgentRuntime) boundary and
//!   [`ChatRuntime`](runtime::ChatRuntime).
//! - [`prompt`]: [`PromptComposer`](prompt::PromptComposer).
//! - [`preferences`]: [`UserPreferences`](preferences::UserPreferences).
//! - [`events`]: [`SessionEvent`](events::SessionEvent) and handlers.
//! - [`config`]: session and runtime settings.

pub mod config;
pub mod events;
pub mod history;
pub mod preferences;
pub mod prompt;
pub mod runtime;
pub mod session;

pub use config::{RuntimeConfig, SessionConfig};
pub use events::{
    CompositeEventHandler, EventHandler, FnEventHandler, LoggingHandler, NoopHandler, SessionEvent,
};
pub use history::{ConversationLog, HistoryWindow};
pub use preferences::UserPreferences;
pub use prompt::PromptComposer;
pub use runtime::{AgentReply, AgentRuntime, ChatRuntime, RuntimeFuture};
pub use session::{ConversationSession, SessionState, SubmitOutcome, TurnReport, is_exit_command};
