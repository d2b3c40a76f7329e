//! Append-only conversation log and history windowing.
//!
//! [`ConversationLog`] owns the session's messages and enforces the
//! tool-call pairing invariants on every append: a tool result must answer a
//! call issued earlier and not yet answered, and call ids are never reused.
//! A turn's messages are staged in an [`Exchange`] and committed together,
//! so a failed turn leaves the log untouched.
//!
//! [`HistoryWindow`] decides what part of the log the runtime sees. It never
//! modifies the log.

use crate::error::HistoryError;
use crate::{Message, MessageRole};
use std::collections::HashSet;

/// Tool-call ids issued and answered so far.
#[derive(Debug, Clone, Default)]
struct CallLedger {
    issued: HashSet<String>,
    answered: HashSet<String>,
}

impl CallLedger {
    fn admit(&mut self, message: &Message) -> Result<(), HistoryError> {
        for call in message.calls() {
            if !self.issued.insert(call.id.clone()) {
                return Err(HistoryError::DuplicateToolCallId(call.id.clone()));
            }
        }
        if message.role == MessageRole::Tool {
            let id = message
                .tool_call_id
                .as_deref()
                .ok_or(HistoryError::MissingToolCallId)?;
            if !self.issued.contains(id) {
                return Err(HistoryError::UnknownToolCallId(id.to_string()));
            }
            if !self.answered.insert(id.to_string()) {
                return Err(HistoryError::DuplicateToolResult(id.to_string()));
            }
        }
        Ok(())
    }

    fn unanswered(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .issued
            .difference(&self.answered)
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// The session's ordered message history.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
    ledger: CallLedger,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message.
    pub fn append(&mut self, message: Message) -> Result<(), HistoryError> {
        self.ledger.admit(&message)?;
        self.messages.push(message);
        Ok(())
    }

    /// Start staging a turn's messages against the current log.
    pub fn begin_exchange(&self) -> Exchange {
        Exchange {
            messages: Vec::new(),
            ledger: self.ledger.clone(),
        }
    }

    /// Commit a staged exchange. Fails, leaving the log unchanged, if any
    /// tool call issued in the exchange is still unanswered.
    pub fn commit(&mut self, exchange: Exchange) -> Result<(), HistoryError> {
        let pending = exchange.ledger.unanswered();
        if !pending.is_empty() {
            return Err(HistoryError::UnansweredToolCalls(pending.join(", ")));
        }
        self.messages.extend(exchange.messages);
        self.ledger = exchange.ledger;
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Messages staged during one turn.
#[derive(Debug, Clone)]
pub struct Exchange {
    messages: Vec<Message>,
    ledger: CallLedger,
}

impl Exchange {
    /// Stage a message, checking it against the log plus what is staged.
    pub fn push(&mut self, message: Message) -> Result<(), HistoryError> {
        self.ledger.admit(&message)?;
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Policy for the slice of history submitted to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    /// Submit everything.
    #[default]
    Unbounded,
    /// Leading system messages plus roughly the last `n` messages (at least
    /// one). The cut moves back so a tool result is never separated from
    /// the assistant message that issued it.
    KeepRecent(usize),
}

impl HistoryWindow {
    /// Select the messages to submit, given the committed log and the
    /// current turn's staged messages.
    pub fn view(&self, log: &ConversationLog, exchange: &Exchange) -> Vec<Message> {
        let all: Vec<Message> = log
            .messages()
            .iter()
            .chain(exchange.messages())
            .cloned()
            .collect();
        self.apply(all)
    }

    pub fn apply(&self, messages: Vec<Message>) -> Vec<Message> {
        let HistoryWindow::KeepRecent(n) = *self else {
            return messages;
        };
        let keep = n.max(1);
        let prefix = messages
            .iter()
            .take_while(|m| m.role == MessageRole::System)
            .count();
        let body_len = messages.len() - prefix;
        if body_len <= keep {
            return messages;
        }

        let mut start = messages.len() - keep;
        while start > prefix && messages[start].role == MessageRole::Tool {
            start -= 1;
        }

        let mut kept: Vec<Message> = messages[..prefix].to_vec();
        kept.extend_from_slice(&messages[start..]);
        kept
    }
}
