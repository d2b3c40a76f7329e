//! Session and runtime configuration.
//!
//! ```
//! use tempo::agent::config::{RuntimeConfig, SessionConfig};
//! use tempo::agent::history::HistoryWindow;
//!
//! let session = SessionConfig::default()
//!     .with_max_rounds(8)
//!     .with_window(HistoryWindow::KeepRecent(40));
//! let runtime = RuntimeConfig::new("gemini-2.5-flash").with_temperature(0.2);
//! assert_eq!(session.max_rounds, 8);
//! assert_eq!(runtime.temperature, Some(0.2));
//! ```

use super::history::HistoryWindow;
use crate::api::retry::RetryConfig;

/// Default cap on runtime rounds per turn.
pub const DEFAULT_MAX_ROUNDS: u32 = 16;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Runtime rounds allowed per turn before it fails with
    /// [`RuntimeError::RoundLimit`](crate::error::RuntimeError::RoundLimit).
    pub max_rounds: u32,
    /// Slice of history submitted to the runtime.
    pub window: HistoryWindow,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            window: HistoryWindow::Unbounded,
        }
    }
}

impl SessionConfig {
    /// A zero cap is raised to one.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }
}

/// Model parameters for [`ChatRuntime`](super::runtime::ChatRuntime).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub model: String,
    /// Zero leaves the limit to the provider.
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub retry: RetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(crate::DEFAULT_MODEL)
    }
}

impl RuntimeConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: 0,
            temperature: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retry = RetryConfig::with_retries(retries);
        self
    }
}
