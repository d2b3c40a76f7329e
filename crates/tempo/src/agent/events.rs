//! Session lifecycle events and their handlers.
//!
//! A [`ConversationSession`](super::session::ConversationSession) reports
//! everything it does through [`SessionEvent`]s: state transitions, runtime
//! rounds, tool executions and turn outcomes. Hosts observe them by
//! implementing [`EventHandler`].
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests and one-shot runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures |
//! | [`CompositeEventHandler`] | Several handlers in order |

use super::session::SessionState;
use crate::error::RuntimeError;
use tracing::{debug, info, warn};

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted by a conversation session.
#[derive(Debug)]
pub enum SessionEvent<'a> {
    /// The session moved between states.
    StateChanged { from: SessionState, to: SessionState },
    /// A user submission opened a new turn.
    TurnStarted { input: &'a str },
    /// The runtime is about to be consulted.
    RoundStart {
        round: u32,
        max_rounds: u32,
        /// Messages submitted this round, after windowing.
        messages: usize,
    },
    /// The runtime produced text, either alongside tool calls or as the
    /// final answer.
    Text { content: &'a str, is_final: bool },
    /// The runtime requested tool calls.
    ToolCallsReceived { round: u32, count: usize },
    /// A tool is about to run.
    ToolExecuting { name: &'a str, arguments: &'a str },
    /// A tool finished; `result` is the content recorded in history.
    ToolResult {
        name: &'a str,
        call_id: &'a str,
        result: &'a str,
        is_error: bool,
    },
    /// The turn ended with a final answer.
    TurnFinished { rounds: u32, answer: &'a str },
    /// The turn failed; the staged exchange was discarded.
    TurnFailed { error: &'a RuntimeError },
    /// An exit command ended the session.
    Terminated,
}

/// Observer for session events.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &SessionEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
///
/// ```
/// use tempo::agent::events::{EventHandler, FnEventHandler, SessionEvent};
///
/// let handler = FnEventHandler::new(|event| {
///     if let SessionEvent::Text { content, .. } = event {
///         println!("{content}");
///     }
/// });
/// handler.on_event(&SessionEvent::Terminated);
/// ```
pub struct FnEventHandler<F>(F)
where
    F: Fn(&SessionEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) {
        (self.0)(event)
    }
}

/// Dispatches each event to several handlers in registration order.
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Add `handler` only when `condition` holds.
    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }

    pub fn with_opt(self, handler: Option<impl EventHandler + 'static>) -> Self {
        match handler {
            Some(h) => self.with(h),
            None => self,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// Logs events through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match event {
            SessionEvent::StateChanged { from, to } => {
                debug!("Session state: {from:?} -> {to:?}");
            }
            SessionEvent::TurnStarted { input } => {
                debug!("Turn started ({} chars)", input.chars().count());
            }
            SessionEvent::RoundStart {
                round,
                max_rounds,
                messages,
            } => {
                info!("[round {round}/{max_rounds}] {messages} message(s)");
            }
            SessionEvent::Text { content, is_final } => {
                let preview: String = content.chars().take(200).collect();
                debug!(
                    "Runtime text{}: {preview}{}",
                    if *is_final { " (final)" } else { "" },
                    if content.chars().count() > 200 { "..." } else { "" }
                );
            }
            SessionEvent::ToolCallsReceived { round, count } => {
                debug!("{count} tool call(s) in round {round}");
            }
            SessionEvent::ToolExecuting { name, .. } => {
                debug!("Executing tool: {name}");
            }
            SessionEvent::ToolResult {
                name,
                result,
                is_error,
                ..
            } => {
                if *is_error {
                    warn!("Tool {name} failed: {result}");
                } else {
                    debug!("Tool {name} result: {} bytes", result.len());
                }
            }
            SessionEvent::TurnFinished { rounds, .. } => {
                info!("Turn finished after {rounds} round(s)");
            }
            SessionEvent::TurnFailed { error } => {
                warn!("Turn failed: {error}");
            }
            SessionEvent::Terminated => {
                info!("Session terminated");
            }
        }
    }
}
