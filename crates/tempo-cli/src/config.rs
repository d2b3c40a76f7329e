//! Environment-driven configuration.
//!
//! [`AgentConfig`] reads the process environment (already seeded from
//! `.env` by `main`) and turns it into the core's building blocks via
//! [`build_runtime`](AgentConfig::build_runtime),
//! [`build_registry`](AgentConfig::build_registry) and
//! [`build_session_config`](AgentConfig::build_session_config).

use anyhow::{Context, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempo::agent::{ChatRuntime, RuntimeConfig, SessionConfig, UserPreferences};
use tempo::calendar::{CalendarService, CalendarToolsExt, GoogleCalendarClient, normalize_timezone};
use tempo::tools::ToolRegistry;
use tempo::{ChatClient, DEFAULT_MODEL, GEMINI_OPENAI_URL};
use tracing::debug;

use crate::render::secret_status;

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const LLM_ENDPOINT: &str = "TEMPO_LLM_ENDPOINT";
pub const CALENDAR_TOKEN: &str = "GOOGLE_CALENDAR_TOKEN";
pub const CALENDAR_TOKEN_FILE: &str = "GOOGLE_CALENDAR_TOKEN_FILE";
pub const DEFAULT_TIMEZONE: &str = "CLI_DEFAULT_TIMEZONE";
pub const PROFILE_PATH: &str = "CALENDAR_CLI_PROFILE";
pub const SYSTEM_PROMPT_PATH: &str = "CALENDAR_CLI_SYSTEM_PROMPT";

pub const DEFAULT_TOKEN_FILE: &str = "token.json";
pub const DEFAULT_PROFILE_FILE: &str = "user_profile.yaml";
pub const DEFAULT_SYSTEM_PROMPT_FILE: &str = "system_prompt.md";
pub const FALLBACK_TIMEZONE: &str = "Etc/UTC";

/// Settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub google_api_key: Option<String>,
    /// Default: `gemini-2.5-flash`.
    pub model: String,
    /// Chat completions URL. Default: Gemini's OpenAI-compatible endpoint.
    pub llm_endpoint: String,
    pub calendar_token: Option<String>,
    pub calendar_token_file: PathBuf,
    /// Fallback IANA zone. Default: `Etc/UTC`.
    pub default_timezone: String,
    pub profile_path: PathBuf,
    pub system_prompt_path: PathBuf,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            google_api_key: get(GOOGLE_API_KEY),
            model: get(GEMINI_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_endpoint: get(LLM_ENDPOINT).unwrap_or_else(|| GEMINI_OPENAI_URL.to_string()),
            calendar_token: get(CALENDAR_TOKEN),
            calendar_token_file: get(CALENDAR_TOKEN_FILE)
                .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE), PathBuf::from),
            default_timezone: get(DEFAULT_TIMEZONE).unwrap_or_else(|| FALLBACK_TIMEZONE.to_string()),
            profile_path: get(PROFILE_PATH)
                .map_or_else(|| PathBuf::from(DEFAULT_PROFILE_FILE), PathBuf::from),
            system_prompt_path: get(SYSTEM_PROMPT_PATH)
                .map_or_else(|| PathBuf::from(DEFAULT_SYSTEM_PROMPT_FILE), PathBuf::from),
        }
    }

    pub fn api_key(&self) -> anyhow::Result<&str> {
        match &self.google_api_key {
            Some(key) => Ok(key),
            None => bail!(
                "{GOOGLE_API_KEY} not set. Set it in your environment or in a .env file \
                 (or run `tempo configure-google`)."
            ),
        }
    }

    /// The calendar access token: `GOOGLE_CALENDAR_TOKEN`, else the token
    /// file.
    pub fn calendar_access_token(&self) -> anyhow::Result<String> {
        if let Some(token) = &self.calendar_token {
            return Ok(token.clone());
        }
        read_token_file(&self.calendar_token_file).with_context(|| {
            format!(
                "no calendar credentials: set {CALENDAR_TOKEN} or provide {}",
                self.calendar_token_file.display()
            )
        })
    }

    pub fn build_runtime(&self) -> anyhow::Result<ChatRuntime> {
        let client = ChatClient::new(self.api_key()?)
            .context("failed to create runtime client")?
            .with_endpoint(self.llm_endpoint.clone());
        debug!("Runtime: model={} endpoint={}", self.model, self.llm_endpoint);
        Ok(ChatRuntime::new(client, RuntimeConfig::new(self.model.clone())))
    }

    pub fn build_calendar(&self) -> anyhow::Result<Arc<dyn CalendarService>> {
        let client = GoogleCalendarClient::new(self.calendar_access_token()?)
            .context("failed to create calendar client")?;
        Ok(Arc::new(client))
    }

    /// The six calendar tools bound to Google Calendar.
    pub fn build_registry(&self) -> anyhow::Result<ToolRegistry> {
        let registry = ToolRegistry::new()
            .with_calendar_tools(self.build_calendar()?)
            .context("failed to register calendar tools")?;
        Ok(registry)
    }

    pub fn build_session_config(&self) -> SessionConfig {
        SessionConfig::default()
    }

    /// Event timezone: explicit flag, then profile, then
    /// `CLI_DEFAULT_TIMEZONE`, then `Etc/UTC`. Bare `UTC` is normalized.
    pub fn resolve_timezone(&self, flag: Option<&str>, prefs: Option<&UserPreferences>) -> String {
        let profile_tz = prefs
            .and_then(|p| p.timezone.as_deref())
            .map(str::trim)
            .filter(|tz| !tz.is_empty());
        let chosen = flag
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .or(profile_tz)
            .unwrap_or(&self.default_timezone);
        normalize_timezone(chosen)
    }

    /// Rows for `env-info`. Secrets are shown as `SET`/`-`.
    pub fn env_rows(&self) -> Vec<Vec<String>> {
        let row = |k: &str, v: String| vec![k.to_string(), v];
        vec![
            row(GOOGLE_API_KEY, secret_status(self.google_api_key.as_deref())),
            row(GEMINI_MODEL, self.model.clone()),
            row(LLM_ENDPOINT, self.llm_endpoint.clone()),
            row(CALENDAR_TOKEN, secret_status(self.calendar_token.as_deref())),
            row(CALENDAR_TOKEN_FILE, self.calendar_token_file.display().to_string()),
            row(DEFAULT_TIMEZONE, self.default_timezone.clone()),
            row(PROFILE_PATH, self.profile_path.display().to_string()),
            row(SYSTEM_PROMPT_PATH, self.system_prompt_path.display().to_string()),
        ]
    }
}

/// Read an access token from a JSON file with a `token` or `access_token`
/// field.
pub fn read_token_file(path: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let json: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    ["token", "access_token"]
        .iter()
        .find_map(|field| json.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .filter(|t| !t.is_empty())
        .with_context(|| format!("{} has no token or access_token field", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AgentConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AgentConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let c = config(&[(GEMINI_MODEL, "  ")]);
        assert!(c.google_api_key.is_none());
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.llm_endpoint, GEMINI_OPENAI_URL);
        assert_eq!(c.default_timezone, FALLBACK_TIMEZONE);
        assert_eq!(c.profile_path, PathBuf::from(DEFAULT_PROFILE_FILE));
        assert_eq!(c.system_prompt_path, PathBuf::from(DEFAULT_SYSTEM_PROMPT_FILE));
        assert!(c.api_key().is_err());
    }

    #[test]
    fn env_values_override_defaults() {
        let c = config(&[
            (GOOGLE_API_KEY, "k"),
            (GEMINI_MODEL, "gemini-2.5-pro"),
            (PROFILE_PATH, "/tmp/me.yaml"),
        ]);
        assert_eq!(c.api_key().unwrap(), "k");
        assert_eq!(c.model, "gemini-2.5-pro");
        assert_eq!(c.profile_path, PathBuf::from("/tmp/me.yaml"));
    }

    #[test]
    fn timezone_precedence() {
        let c = config(&[(DEFAULT_TIMEZONE, "America/New_York")]);
        let prefs = UserPreferences {
            timezone: Some("Europe/Istanbul".into()),
            ..Default::default()
        };
        assert_eq!(c.resolve_timezone(Some("Asia/Tokyo"), Some(&prefs)), "Asia/Tokyo");
        assert_eq!(c.resolve_timezone(None, Some(&prefs)), "Europe/Istanbul");
        assert_eq!(c.resolve_timezone(Some(" "), None), "America/New_York");
        assert_eq!(config(&[]).resolve_timezone(None, None), "Etc/UTC");
        assert_eq!(c.resolve_timezone(Some("utc"), None), "Etc/UTC");
    }

    #[test]
    fn env_rows_mask_secrets() {
        let c = config(&[(GOOGLE_API_KEY, "secret"), (CALENDAR_TOKEN, "tok")]);
        let rows = c.env_rows();
        assert_eq!(rows[0], vec![GOOGLE_API_KEY.to_string(), "SET".to_string()]);
        assert_eq!(rows[3][1], "SET");
        assert!(rows.iter().all(|r| !r[1].contains("secret")));
    }

    #[test]
    fn token_from_env_wins_over_file() {
        let c = config(&[(CALENDAR_TOKEN, "from-env"), (CALENDAR_TOKEN_FILE, "/nonexistent")]);
        assert_eq!(c.calendar_access_token().unwrap(), "from-env");
    }

    #[test]
    fn token_file_fields() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        std::fs::write(&a, r#"{"token": "ya29.a", "refresh_token": "r"}"#).unwrap();
        assert_eq!(read_token_file(&a).unwrap(), "ya29.a");

        let b = dir.path().join("b.json");
        std::fs::write(&b, r#"{"access_token": "ya29.b"}"#).unwrap();
        assert_eq!(read_token_file(&b).unwrap(), "ya29.b");

        let c = dir.path().join("c.json");
        std::fs::write(&c, r#"{"refresh_token": "r"}"#).unwrap();
        assert!(read_token_file(&c).is_err());

        assert!(read_token_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn runtime_requires_api_key() {
        assert!(config(&[]).build_runtime().is_err());
        let runtime = config(&[(GOOGLE_API_KEY, "k")]).build_runtime().unwrap();
        assert_eq!(runtime.config().model, DEFAULT_MODEL);
    }

    #[test]
    fn registry_has_all_calendar_tools() {
        let registry = config(&[(CALENDAR_TOKEN, "tok")]).build_registry().unwrap();
        assert_eq!(registry.len(), 6);
    }
}
