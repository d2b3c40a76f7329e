//! The editable system prompt override file.

use crate::profile::write_if_missing;
use std::path::Path;
use tracing::{debug, warn};

pub const SYSTEM_PROMPT_TEMPLATE: &str = "\
# System prompt (edit freely)

Role: time-management consultant and calendar agent.
Goal: answer briefly and clearly; make safe calendar changes when needed.
Style: no padding. End with \"Would you like me to add suggestions and a brief scientific explanation? (Y/N)\"

House rules:
- Focus peaks 09:00-11:00 and 16:00-18:00; it dips around 14:00 and late evening.
- Put important work into peak hours; say no to unnecessary meetings.
- 20-20-20 for the eyes; a 5-10 minute active break every 60-90 minutes.
- Log time, sort by importance and urgency, review at the end of the day.

Replace this text with your own method if you like. It is placed before the built-in instructions.
";

/// Create the override template at `path` if it does not exist.
pub fn init_system_prompt(path: &Path) -> anyhow::Result<bool> {
    write_if_missing(path, SYSTEM_PROMPT_TEMPLATE)
}

/// Read the override text. Missing, unreadable and whitespace-only files
/// yield `None`.
pub fn load_override(path: &Path) -> Option<String> {
    if !path.exists() {
        debug!("No system prompt override at {}", path.display());
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => None,
        Ok(text) => Some(text.trim().to_string()),
        Err(e) => {
            warn!("Could not read system prompt override {}: {e}", path.display());
            None
        }
    }
}
