//! The agent runtime boundary.
//!
//! An [`AgentRuntime`] reads the message history and tool definitions and
//! answers with an [`AgentReply`]: either a final answer or a non-empty list
//! of tool calls. [`ChatRuntime`] implements it over an OpenAI-compatible
//! [`ChatClient`].

use super::config::RuntimeConfig;
use crate::api::retry::retry_runtime_call;
use crate::error::RuntimeError;
use crate::{ChatClient, ChatCompletion, ChatRequest, Message, ToolCall, ToolDef};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Boxed future returned by [`AgentRuntime::respond`].
pub type RuntimeFuture<'a> = Pin<Box<dyn Future<Output = Result<AgentReply, RuntimeError>> + Send + 'a>>;

/// What the runtime decided for one round.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// Final answer for the turn.
    Final { content: String },
    /// Tool calls to run, in order, plus any text produced alongside them.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
}

impl AgentReply {
    pub fn final_answer(content: impl Into<String>) -> Self {
        AgentReply::Final {
            content: content.into(),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        AgentReply::ToolCalls {
            content: None,
            calls,
        }
    }

    /// Classify a raw completion. Tool calls win over text; a completion
    /// with neither is [`RuntimeError::Empty`]. Calls must carry an id and
    /// a function name.
    pub fn from_completion(completion: ChatCompletion) -> Result<Self, RuntimeError> {
        let content = completion
            .content
            .filter(|c| !c.trim().is_empty());

        if completion.tool_calls.is_empty() {
            return content
                .map(|content| AgentReply::Final { content })
                .ok_or(RuntimeError::Empty);
        }

        for call in &completion.tool_calls {
            if call.id.trim().is_empty() {
                return Err(RuntimeError::Malformed(format!(
                    "tool call to '{}' has no id",
                    call.function.name
                )));
            }
            if call.function.name.trim().is_empty() {
                return Err(RuntimeError::Malformed(format!(
                    "tool call '{}' has no function name",
                    call.id
                )));
            }
        }

        Ok(AgentReply::ToolCalls {
            content,
            calls: completion.tool_calls,
        })
    }

    /// The assistant message recording this reply.
    pub fn to_message(&self) -> Message {
        match self {
            AgentReply::Final { content } => Message::assistant_text(content.clone()),
            AgentReply::ToolCalls { content, calls } => {
                Message::assistant_tool_calls(content.clone(), calls.clone())
            }
        }
    }
}

/// A tool-calling decision maker.
pub trait AgentRuntime: Send + Sync {
    fn respond<'a>(&'a self, messages: &'a [Message], tools: &'a [ToolDef]) -> RuntimeFuture<'a>;
}

/// [`AgentRuntime`] backed by a chat completions endpoint.
pub struct ChatRuntime {
    client: ChatClient,
    config: RuntimeConfig,
}

impl ChatRuntime {
    pub fn new(client: ChatClient, config: RuntimeConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn request(&self, messages: &[Message], tools: &[ToolDef]) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools: (!tools.is_empty()).then(|| tools.to_vec()),
            ..Default::default()
        }
    }
}

impl AgentRuntime for ChatRuntime {
    fn respond<'a>(&'a self, messages: &'a [Message], tools: &'a [ToolDef]) -> RuntimeFuture<'a> {
        Box::pin(async move {
            let request = self.request(messages, tools);
            let completion =
                retry_runtime_call(&self.config.retry, || self.client.chat(&request)).await?;
            if let Some(reason) = &completion.finish_reason {
                debug!("Finish reason: {reason}");
            }
            AgentReply::from_completion(completion)
        })
    }
}
