//! System prompt composition.
//!
//! [`PromptComposer`] layers the pieces of the system instruction in a fixed
//! order: user override text, the role and policy text, the current local and
//! UTC time, and the preference summary. It performs no I/O; the host
//! resolves the clock, the preferences file and the override file first.

use super::preferences::UserPreferences;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

/// Timestamp layout used in the prompt, e.g. `2025-03-04 09:15:00 +03+0300`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z%z";

/// Built-in persona, communication style and planning heuristics.
pub const ROLE_AND_POLICY: &str = "\
Role: time-management consultant and calendar agent.
Goal: answer the user's request briefly and clearly; when needed, perform safe operations on their calendar with the tools provided.
Communication: no padding or preamble. Unless the user says otherwise, end every reply with exactly this question: \"Would you like me to add suggestions and a brief scientific explanation? (Y/N)\"

Internal planning rules (do not recite them unless asked):
- Biological clock: focus peaks around 09:00-11:00 and 16:00-18:00; it dips around 14:00 and late in the evening.
- Time management: plan important work into peak hours, avoid procrastination, watch for traps such as unnecessary meetings and social media.
- Breaks and health: follow the 20-20-20 rule for the eyes; take a 5-10 minute active break every 60-90 minutes; change posture and stretch.
- Process: keep a time log, sort tasks by importance and urgency, execute, review at the end of the day.
- Placement: high-focus work in peak hours, routine work in low-energy periods, creative work early in the morning or in a calm evening.
- Before creating or moving an event, check for conflicts with search_events when the time window might be busy.
- Resolve relative dates (\"tomorrow\", \"next Friday\") against the current date-time below and use the user's timezone.";

/// Builder for prompts made of blank-line separated blocks.
///
/// Blocks are trimmed; empty ones are skipped.
///
/// ```
/// use tempo::agent::prompt::SystemPromptBuilder;
///
/// let prompt = SystemPromptBuilder::new()
///     .raw("  Be brief.  ")
///     .raw_opt(None::<String>)
///     .section("Context", "Today is Monday.")
///     .build();
///
/// assert_eq!(prompt, "Be brief.\n\n## Context\n\nToday is Monday.");
/// ```
#[derive(Debug, Default)]
pub struct SystemPromptBuilder {
    blocks: Vec<String>,
}

impl SystemPromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block verbatim (trimmed).
    pub fn raw(mut self, content: impl AsRef<str>) -> Self {
        let content = content.as_ref().trim();
        if !content.is_empty() {
            self.blocks.push(content.to_string());
        }
        self
    }

    /// Append a block only if it is `Some`.
    pub fn raw_opt(self, content: Option<impl AsRef<str>>) -> Self {
        match content {
            Some(c) => self.raw(c),
            None => self,
        }
    }

    /// Append a block under a `##` heading. Skipped if `content` is empty.
    pub fn section(mut self, heading: &str, content: impl AsRef<str>) -> Self {
        let content = content.as_ref().trim();
        if !content.is_empty() {
            self.blocks.push(format!("## {heading}\n\n{content}"));
        }
        self
    }

    pub fn build(self) -> String {
        self.blocks.join("\n\n")
    }
}

/// Composes the system instruction for a session.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    role_text: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptComposer {
    pub fn new() -> Self {
        Self {
            role_text: ROLE_AND_POLICY.to_string(),
        }
    }

    /// Replace the built-in role and policy text.
    pub fn with_role_text(mut self, role_text: impl Into<String>) -> Self {
        self.role_text = role_text.into();
        self
    }

    /// Build the system instruction.
    ///
    /// Order: override text (trimmed; whitespace-only counts as absent),
    /// role and policy text, local and UTC timestamps, preference summary.
    /// Blocks are separated by a blank line. `now_utc` must be the UTC
    /// equivalent of `now_local`. Deterministic for identical inputs.
    pub fn compose<Tz>(
        &self,
        now_local: &DateTime<Tz>,
        now_utc: &DateTime<Utc>,
        preferences: Option<&UserPreferences>,
        override_text: Option<&str>,
    ) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let clock = format!(
            "Current date-time (local): {}\nCurrent date-time (UTC): {}",
            now_local.format(TIMESTAMP_FORMAT),
            now_utc.format(TIMESTAMP_FORMAT),
        );

        SystemPromptBuilder::new()
            .raw_opt(override_text)
            .raw(&self.role_text)
            .raw(clock)
            .raw_opt(preferences.and_then(UserPreferences::summary))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn clock() -> (DateTime<FixedOffset>, DateTime<Utc>) {
        let local = DateTime::parse_from_rfc3339("2025-03-04T09:15:00+03:00").unwrap();
        (local, local.with_timezone(&Utc))
    }

    #[test]
    fn compose_is_deterministic() {
        let (local, utc) = clock();
        let prefs = UserPreferences {
            timezone: Some("Europe/Istanbul".into()),
            ..Default::default()
        };
        let composer = PromptComposer::new();
        let a = composer.compose(&local, &utc, Some(&prefs), Some("Custom"));
        let b = composer.compose(&local, &utc, Some(&prefs), Some("Custom"));
        assert_eq!(a, b);
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let (local, utc) = clock();
        let prefs = UserPreferences {
            lunch: Some("12:30-13:30".into()),
            ..Default::default()
        };
        let prompt = PromptComposer::new().compose(&local, &utc, Some(&prefs), Some("\n  My rules.  \n"));

        assert!(prompt.starts_with("My rules.\n\nRole: time-management consultant"));
        let role = prompt.find("Role:").unwrap();
        let clock = prompt.find("Current date-time (local):").unwrap();
        let profile = prompt.find("User profile:").unwrap();
        assert!(role < clock && clock < profile);
        assert!(prompt.ends_with("User profile:\n- Lunch break: 12:30-13:30"));
    }

    #[test]
    fn timestamps_include_offsets() {
        let (local, utc) = clock();
        let prompt = PromptComposer::new().compose(&local, &utc, None, None);
        assert!(prompt.contains("Current date-time (local): 2025-03-04 09:15:00 +03:00+0300"));
        assert!(prompt.contains("Current date-time (UTC): 2025-03-04 06:15:00 UTC+0000"));
    }

    #[test]
    fn missing_inputs_omit_their_sections() {
        let (local, utc) = clock();
        let prompt = PromptComposer::new().compose(&local, &utc, None, Some("   "));
        assert!(prompt.starts_with("Role:"));
        assert!(!prompt.contains("User profile:"));
        assert!(prompt.ends_with("UTC+0000"));
    }

    #[test]
    fn mandated_closing_question_is_present() {
        assert!(ROLE_AND_POLICY.contains("(Y/N)"));
    }

    #[test]
    fn works_with_named_zones() {
        let tz: chrono_tz::Tz = "Europe/Istanbul".parse().unwrap();
        let (_, utc) = clock();
        let local = utc.with_timezone(&tz);
        let prompt = PromptComposer::new()
            .with_role_text("Role: test")
            .compose(&local, &utc, None, None);
        assert!(prompt.contains("Current date-time (local): 2025-03-04 09:15:00 +03+0300"));
    }
}
