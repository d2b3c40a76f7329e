//! Tool abstraction and name-addressed dispatch.
//!
//! The [`Tool`] trait defines what every tool provides: a definition (name,
//! description, JSON Schema) and an async `invoke`. Tools are collected into
//! a [`ToolRegistry`] which resolves names, validates arguments against the
//! declared schema, and renders results for the conversation.

use crate::error::{RegistryError, ToolError};
use crate::{ToolCall, ToolDef};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Maximum size (in bytes) for rendered tool output before truncation.
pub const DEFAULT_MAX_RESULT_BYTES: usize = 30_000;

/// Boxed future returned by [`Tool::invoke`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;

// ── Tool trait ─────────────────────────────────────────────────────

/// A tool that the agent can invoke via function-calling.
///
/// `invoke` receives arguments that already passed the registry's schema
/// check. Implementations still deserialize into their typed argument struct
/// and may reject semantically invalid input with
/// [`ToolError::InvalidArguments`] before making any external call.
///
/// Uses a boxed future so that the trait is dyn-compatible.
pub trait Tool: Send + Sync {
    /// The tool definition sent to the runtime.
    fn definition(&self) -> ToolDef;

    /// Execute the tool with schema-checked JSON arguments.
    fn invoke(&self, arguments: Value) -> ToolFuture<'_>;

    /// The tool's name (delegates to definition).
    fn name(&self) -> String {
        self.definition().function.name
    }
}

// ── ToolRegistry ───────────────────────────────────────────────────

/// A fixed set of tools dispatched by name.
///
/// Registration is fail-fast: a second tool with an existing name is a
/// [`RegistryError::DuplicateToolName`]. Definitions are exported in
/// registration order. Once handed to a session the registry is only read.
///
/// # Example
///
/// ```ignore
/// let tools = ToolRegistry::new()
///     .with_max_result_bytes(15_000)
///     .with_calendar_tools(calendar)?;
///
/// let defs = tools.definitions();
/// let created = tools.invoke("create_calendar_event", &args).await?;
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
    max_result_bytes: usize,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("max_result_bytes", &self.max_result_bytes)
            .finish()
    }
}

/// A tool call's result rendered for the conversation.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Content of the tool-result message.
    pub content: String,
    /// The error, when the invocation failed.
    pub error: Option<ToolError>,
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            max_result_bytes: DEFAULT_MAX_RESULT_BYTES,
        }
    }

    /// Set the maximum rendered result size in bytes before truncation.
    pub fn with_max_result_bytes(mut self, max: usize) -> Self {
        self.max_result_bytes = max;
        self
    }

    /// Register a tool. Fails if a tool with the same name is present.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let name = tool.name();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateToolName(name));
        }
        debug!("Registered tool {name}");
        self.index.insert(name, self.tools.len());
        self.tools.push(Box::new(tool));
        Ok(())
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, tool: impl Tool + 'static) -> Result<Self, RegistryError> {
        self.register(tool)?;
        Ok(self)
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Resolve, validate and run one tool.
    ///
    /// `arguments` is the JSON-encoded object from the tool call. Lookup
    /// failures yield [`ToolError::UnknownTool`]; unparsable or
    /// schema-violating arguments yield [`ToolError::InvalidArguments`]
    /// without the tool running. A valid call runs the tool exactly once and
    /// returns its result unchanged.
    pub async fn invoke(&self, name: &str, arguments: &str) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = parse_arguments(name, arguments)?;
        validate_arguments(&tool.definition(), &args)?;

        log_tool_call(name, arguments);
        let start = Instant::now();
        let result = tool.invoke(args).await;
        debug!(
            "Tool {name} {} in {:.0}ms",
            if result.is_ok() { "completed" } else { "failed" },
            start.elapsed().as_secs_f64() * 1000.0,
        );
        result
    }

    /// Run a model-issued tool call and render its result (or error) as
    /// tool-result content. Never fails: errors become content.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match self
            .invoke(&call.function.name, &call.function.arguments)
            .await
        {
            Ok(value) => {
                let content = truncate_result(render_value(&value), self.max_result_bytes);
                trace!("Tool {} result preview: {}", call.function.name, preview(&content, 300));
                ToolOutcome {
                    content,
                    error: None,
                }
            }
            Err(e) => {
                info!("Tool {} returned error: {e}", call.function.name);
                ToolOutcome {
                    content: truncate_result(e.to_tool_content(), self.max_result_bytes),
                    error: Some(e),
                }
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Parse the raw arguments string. An empty string means "no arguments".
fn parse_arguments(tool: &str, arguments: &str) -> Result<Value, ToolError> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments)
        .map_err(|e| ToolError::invalid(tool, format!("arguments are not valid JSON: {e}")))
}

/// Validate arguments against the tool's declared JSON Schema.
pub fn validate_arguments(def: &ToolDef, args: &Value) -> Result<(), ToolError> {
    let validator = match jsonschema::validator_for(&def.function.parameters) {
        Ok(v) => v,
        Err(e) => {
            warn!("Tool {} has an invalid schema, skipping validation: {e}", def.function.name);
            return Ok(());
        }
    };

    let errors: Vec<String> = validator
        .iter_errors(args)
        .map(|e| {
            let path = e.instance_path().to_string();
            if path.is_empty() {
                format!("  - {e}")
            } else {
                format!("  - {path}: {e}")
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolError::invalid(
            &def.function.name,
            format!("schema validation failed:\n{}", errors.join("\n")),
        ))
    }
}

/// Log a tool call at INFO level with a truncated preview of arguments.
pub fn log_tool_call(name: &str, arguments: &str) {
    info!(
        "[tool] {}({}{})",
        name,
        preview(arguments, 120),
        if arguments.chars().count() > 120 { "..." } else { "" }
    );
    trace!("[tool] {name} arguments: {arguments}");
}

/// Render a structured result as tool-result text.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "OK (the calendar service returned no content)".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truncate a string to at most `max` bytes (on a char boundary), appending
/// a notice if trimmed.
pub fn truncate_result(mut s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let total = s.len();
    let cut = (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    s.truncate(cut);
    s.push_str(&format!("...\n[truncated: {total} bytes total]"));
    s
}

fn preview(s: &str, chars: usize) -> String {
    s.chars().take(chars).collect()
}
