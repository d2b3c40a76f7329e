//! Terminal time-management agent for Google Calendar.
//!
//! The `tempo` binary is a thin host around the `tempo` core: it reads the
//! environment and `.env`, loads the preferences and prompt-override files,
//! composes the system prompt and runs a
//! [`ConversationSession`](tempo::agent::ConversationSession) in a line
//! editor.
//!
//! ```sh
//! tempo configure-google            # store GOOGLE_API_KEY in .env
//! tempo init-profile                # write user_profile.yaml
//! tempo ask "What's on tomorrow?"
//! tempo quick-create Standup "2025-03-05 10:00" "2025-03-05 10:30" --color-id 10
//! ```

pub mod chat;
pub mod commands;
pub mod config;
pub mod envfile;
pub mod profile;
pub mod render;
pub mod system_prompt;

pub use config::AgentConfig;
