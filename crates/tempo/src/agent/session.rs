//! The conversation state machine.
//!
//! A [`ConversationSession`] owns the message log for one conversation and
//! drives the tool-calling loop a turn at a time:
//!
//! ```text
//! AwaitingUserInput --line--> DispatchingToRuntime --calls--> ExecutingTools
//!        ^                          |       ^                       |
//!        +------ final answer ------+       +------- results -------+
//! ```
//!
//! Exit commands move the session to `Terminated`. Tool failures become
//! tool-result content and the loop continues; runtime failures end the turn,
//! discard its staged messages and return the session to
//! `AwaitingUserInput`.

use super::config::SessionConfig;
use super::events::{EventHandler, NoopHandler, SessionEvent};
use super::history::ConversationLog;
use super::runtime::{AgentReply, AgentRuntime};
use crate::error::RuntimeError;
use crate::tools::ToolRegistry;
use crate::{Message, MessageRole};
use tracing::debug;

/// Inputs that end the session (compared trimmed and case-folded).
pub const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "q"];

/// Whether `line` is an exit command.
pub fn is_exit_command(line: &str) -> bool {
    let folded = line.trim().to_lowercase();
    EXIT_COMMANDS.contains(&folded.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingUserInput,
    DispatchingToRuntime,
    ExecutingTools,
    Terminated,
}

/// Summary of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub answer: String,
    /// Runtime rounds used.
    pub rounds: u32,
    /// Tool calls executed, failed ones included.
    pub tool_calls: usize,
}

/// What a submission led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The runtime produced a final answer.
    Answered(TurnReport),
    /// Blank input; nothing happened.
    Ignored,
    /// An exit command ended the session, or it had already ended.
    Terminated,
}

pub struct ConversationSession<'a> {
    runtime: &'a dyn AgentRuntime,
    tools: &'a ToolRegistry,
    events: &'a dyn EventHandler,
    config: SessionConfig,
    log: ConversationLog,
    state: SessionState,
}

impl<'a> ConversationSession<'a> {
    /// A session whose history starts with `system_instruction`.
    pub fn new(
        runtime: &'a dyn AgentRuntime,
        tools: &'a ToolRegistry,
        system_instruction: impl Into<String>,
    ) -> Self {
        let mut log = ConversationLog::new();
        // A fresh log accepts any non-tool message.
        let _ = log.append(Message::system(system_instruction));
        Self {
            runtime,
            tools,
            events: &NoopHandler,
            config: SessionConfig::default(),
            log,
            state: SessionState::AwaitingUserInput,
        }
    }

    pub fn with_event_handler(mut self, events: &'a dyn EventHandler) -> Self {
        self.events = events;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the first user message. It is answered by
    /// [`answer_pending`](Self::answer_pending).
    pub fn with_first_message(mut self, text: impl Into<String>) -> Self {
        let _ = self.log.append(Message::user(text));
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Committed history.
    pub fn history(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether the last committed message is a user message awaiting an
    /// answer.
    pub fn has_pending_input(&self) -> bool {
        self.log
            .last()
            .is_some_and(|m| m.role == MessageRole::User)
    }

    /// Answer the seeded (or previously failed) user message, if any.
    pub async fn answer_pending(&mut self) -> Result<Option<TurnReport>, RuntimeError> {
        if self.state == SessionState::Terminated || !self.has_pending_input() {
            return Ok(None);
        }
        let input = self.log.last().map(|m| m.text().to_string()).unwrap_or_default();
        self.events.on_event(&SessionEvent::TurnStarted { input: &input });
        self.run_turn().await.map(Some)
    }

    /// Handle one line of user input.
    ///
    /// Exit commands terminate the session and blank lines are ignored.
    /// Anything else is appended as a user message and answered; tool calls
    /// are executed until the runtime gives a final answer.
    pub async fn submit(&mut self, line: &str) -> Result<SubmitOutcome, RuntimeError> {
        if self.state == SessionState::Terminated {
            return Ok(SubmitOutcome::Terminated);
        }
        if is_exit_command(line) {
            self.transition(SessionState::Terminated);
            self.events.on_event(&SessionEvent::Terminated);
            return Ok(SubmitOutcome::Terminated);
        }
        let text = line.trim();
        if text.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        self.log.append(Message::user(text))?;
        self.events.on_event(&SessionEvent::TurnStarted { input: text });
        self.run_turn().await.map(SubmitOutcome::Answered)
    }

    async fn run_turn(&mut self) -> Result<TurnReport, RuntimeError> {
        match self.run_rounds().await {
            Ok(report) => {
                self.transition(SessionState::AwaitingUserInput);
                self.events.on_event(&SessionEvent::TurnFinished {
                    rounds: report.rounds,
                    answer: &report.answer,
                });
                Ok(report)
            }
            Err(error) => {
                self.transition(SessionState::AwaitingUserInput);
                self.events.on_event(&SessionEvent::TurnFailed { error: &error });
                Err(error)
            }
        }
    }

    async fn run_rounds(&mut self) -> Result<TurnReport, RuntimeError> {
        let definitions = self.tools.definitions();
        let max_rounds = self.config.max_rounds;
        let mut exchange = self.log.begin_exchange();
        let mut tool_calls = 0;

        for round in 1..=max_rounds {
            self.transition(SessionState::DispatchingToRuntime);
            let view = self.config.window.view(&self.log, &exchange);
            self.events.on_event(&SessionEvent::RoundStart {
                round,
                max_rounds,
                messages: view.len(),
            });

            let reply = self.runtime.respond(&view, &definitions).await?;
            exchange.push(reply.to_message())?;

            let calls = match reply {
                AgentReply::Final { content } => {
                    self.events.on_event(&SessionEvent::Text {
                        content: &content,
                        is_final: true,
                    });
                    self.log.commit(exchange)?;
                    return Ok(TurnReport {
                        answer: content,
                        rounds: round,
                        tool_calls,
                    });
                }
                AgentReply::ToolCalls { content, calls } => {
                    if let Some(text) = &content {
                        self.events.on_event(&SessionEvent::Text {
                            content: text,
                            is_final: false,
                        });
                    }
                    calls
                }
            };

            self.events.on_event(&SessionEvent::ToolCallsReceived {
                round,
                count: calls.len(),
            });
            self.transition(SessionState::ExecutingTools);

            for call in &calls {
                self.events.on_event(&SessionEvent::ToolExecuting {
                    name: &call.function.name,
                    arguments: &call.function.arguments,
                });
                let outcome = self.tools.execute(call).await;
                self.events.on_event(&SessionEvent::ToolResult {
                    name: &call.function.name,
                    call_id: &call.id,
                    result: &outcome.content,
                    is_error: outcome.is_error(),
                });
                exchange.push(Message::tool_result(&call.id, outcome.content))?;
                tool_calls += 1;
            }
            debug!("Round {round}: {} tool result(s) staged", calls.len());
        }

        Err(RuntimeError::RoundLimit(max_rounds))
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            let from = std::mem::replace(&mut self.state, to);
            self.events.on_event(&SessionEvent::StateChanged { from, to });
        }
    }
}
