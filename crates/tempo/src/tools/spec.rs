//! Structured tool descriptions with usage guidance.
//!
//! `ToolSpec` turns a purpose line, `when_to_use` / `when_not_to_use`
//! guidance and a few examples into the description string the model sees.
//! The calendar tools overlap heavily (update vs. move, search vs. list), so
//! the negative guidance matters more than the prose.

use crate::ToolDef;

/// A structured tool specification.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name (must be unique within a registry).
    pub name: String,
    /// One-sentence imperative purpose.
    pub purpose: String,
    pub when_to_use: Option<String>,
    /// Prevents confusion with neighbouring tools.
    pub when_not_to_use: Option<String>,
    pub parameters: serde_json::Value,
    /// `(request, expected call)` pairs.
    pub examples: Vec<(String, String)>,
    pub output_format: Option<String>,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        purpose: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            purpose: purpose.into(),
            when_to_use: None,
            when_not_to_use: None,
            parameters,
            examples: Vec::new(),
            output_format: None,
        }
    }

    pub fn when_to_use(mut self, when: impl Into<String>) -> Self {
        self.when_to_use = Some(when.into());
        self
    }

    pub fn when_not_to_use(mut self, when_not: impl Into<String>) -> Self {
        self.when_not_to_use = Some(when_not.into());
        self
    }

    pub fn example(mut self, request: impl Into<String>, call: impl Into<String>) -> Self {
        self.examples.push((request.into(), call.into()));
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    /// Render the description string for the model.
    pub fn to_description(&self) -> String {
        let mut desc = format!("{}.", self.purpose.trim_end_matches('.'));
        if let Some(when) = &self.when_to_use {
            desc.push_str(&format!("\nWhen to use: {when}"));
        }
        if let Some(when_not) = &self.when_not_to_use {
            desc.push_str(&format!("\nWhen NOT to use: {when_not}"));
        }
        if !self.examples.is_empty() {
            desc.push_str("\nExamples:");
            for (request, call) in &self.examples {
                desc.push_str(&format!("\n  - \"{request}\" -> {call}"));
            }
        }
        if let Some(format) = &self.output_format {
            desc.push_str(&format!("\nOutput format: {format}"));
        }
        desc
    }

    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef::new(
            self.name.clone(),
            self.to_description(),
            self.parameters.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_includes_guidance_in_order() {
        let spec = ToolSpec::new("delete_calendar_event", "Delete an event", json!({}))
            .when_to_use("The user asks to cancel or remove an event")
            .when_not_to_use("Rescheduling; use update_calendar_event")
            .example("cancel my 3pm", "search_events, then delete_calendar_event");
        let desc = spec.to_description();

        let purpose = desc.find("Delete an event.").unwrap();
        let when = desc.find("When to use:").unwrap();
        let when_not = desc.find("When NOT to use:").unwrap();
        let examples = desc.find("Examples:").unwrap();
        assert!(purpose < when && when < when_not && when_not < examples);
        assert!(!desc.contains("Output format"));
    }

    #[test]
    fn purpose_is_not_double_punctuated() {
        let spec = ToolSpec::new("x", "List calendars.", json!({}));
        assert_eq!(spec.to_description(), "List calendars.");
    }

    #[test]
    fn tool_def_carries_name_and_schema() {
        let params = json!({"type": "object", "properties": {}});
        let def = ToolSpec::new("get_calendars_info", "List calendars", params.clone()).to_tool_def();
        assert_eq!(def.function.name, "get_calendars_info");
        assert_eq!(def.function.parameters, params);
    }
}
