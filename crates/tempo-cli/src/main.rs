//! `tempo`: chat with a calendar agent, or run calendar actions directly.
//!
//! Reads `GOOGLE_API_KEY` and friends from the environment or a `.env`
//! file in the current directory. See `tempo env-info`.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tempo::agent::UserPreferences;
use tempo_cli::commands::{self, QuickCreate};
use tempo_cli::config::AgentConfig;
use tempo_cli::render::{panel, table};
use tempo_cli::{chat, envfile, profile, system_prompt};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tempo", version, about = "Time-management agent for Google Calendar")]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the agent to manage your calendar.
    Ask {
        /// Start the conversation with this message.
        prompt: Option<String>,
    },
    /// List the calendar tools available to the agent.
    Tools,
    /// Show the configuration read from the environment.
    EnvInfo,
    /// Create an event directly, without the agent.
    QuickCreate {
        /// Event title.
        summary: String,
        /// Start, `YYYY-MM-DD HH:MM`.
        start: String,
        /// End, `YYYY-MM-DD HH:MM`.
        end: String,
        /// IANA timezone, e.g. Europe/Istanbul.
        #[arg(long)]
        timezone: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Google Calendar color id (1-11).
        #[arg(long)]
        color_id: Option<String>,
    },
    /// List your calendars.
    ListCalendars,
    /// Create a starter user_profile.yaml if it doesn't exist.
    InitProfile {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the profile the agent will use.
    ShowProfile {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Create an editable system_prompt.md if it doesn't exist.
    InitSystemPrompt {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Save GOOGLE_API_KEY and GEMINI_MODEL to .env.
    ConfigureGoogle {
        /// Prompted for (hidden) when omitted.
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long, default_value = tempo::DEFAULT_MODEL)]
        model: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_file = dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    if let Some(path) = env_file {
        tracing::debug!("Loaded {}", path.display());
    }

    let config = AgentConfig::from_env();

    match cli.command {
        Command::Ask { prompt } => chat::run(&config, prompt).await?,
        Command::Tools => {
            println!(
                "{}",
                table("Calendar Tools", &["#", "Name", "Purpose"], &commands::tool_rows())
            );
        }
        Command::EnvInfo => println!("{}", commands::env_info(&config)),
        Command::QuickCreate {
            summary,
            start,
            end,
            timezone,
            location,
            description,
            color_id,
        } => {
            let prefs = UserPreferences::load(&config.profile_path);
            let event = QuickCreate {
                summary,
                start,
                end,
                timezone: config.resolve_timezone(timezone.as_deref(), prefs.as_ref()),
                location,
                description,
                color_id,
            };
            let tools = config.build_registry()?;
            println!("{}", commands::quick_create(&tools, &event).await?);
        }
        Command::ListCalendars => {
            let tools = config.build_registry()?;
            println!("{}", commands::list_calendars(&tools).await?);
        }
        Command::InitProfile { path } => {
            let path = path.unwrap_or_else(|| config.profile_path.clone());
            let created = profile::init_profile(&path)?;
            println!("{}", ready_message("Profile", &path, created));
        }
        Command::ShowProfile { path } => {
            let path = path.unwrap_or_else(|| config.profile_path.clone());
            match profile::describe_profile(&path) {
                Some(summary) => println!("{}", panel("User Profile", &summary)),
                None => println!("No profile found. Run: tempo init-profile"),
            }
        }
        Command::InitSystemPrompt { path } => {
            let path = path.unwrap_or_else(|| config.system_prompt_path.clone());
            let created = system_prompt::init_system_prompt(&path)?;
            println!("{}", ready_message("System prompt", &path, created));
        }
        Command::ConfigureGoogle { api_key, model } => {
            let api_key = match api_key {
                Some(key) => Some(key),
                None => Some(
                    rpassword::prompt_password("Google API Key: ")
                        .context("failed to read the API key")?,
                ),
            };
            let out = commands::configure_google(
                &PathBuf::from(envfile::ENV_FILE),
                api_key.as_deref(),
                &model,
            )?;
            println!("{out}");
        }
    }
    Ok(())
}

fn ready_message(what: &str, path: &std::path::Path, created: bool) -> String {
    let note = if created { "created" } else { "already exists, left unchanged" };
    panel("", &format!("{what} ready: {} ({note})", path.display()))
}
