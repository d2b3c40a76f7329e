//! The interactive `ask` loop.

use anyhow::Context;
use chrono::{Local, Utc};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tempo::agent::{
    CompositeEventHandler, ConversationSession, EventHandler, LoggingHandler, PromptComposer,
    SessionEvent, SubmitOutcome, UserPreferences,
};
use tracing::info;

use crate::config::AgentConfig;
use crate::render::panel;
use crate::system_prompt::load_override;

/// Used when `ask` gets no prompt and the user just presses enter.
pub const DEFAULT_REQUEST: &str = "Create a green event for tomorrow 10:00-10:30 named Standup";

const BANNER: &str = "Time Management Agent\nPlan, book and tidy your Google Calendar in plain language.\nType 'exit' to quit.";

/// Prints tool activity and intermediate text to stderr.
pub struct ConsoleHandler;

impl EventHandler for ConsoleHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match event {
            SessionEvent::Text {
                content,
                is_final: false,
            } => eprintln!("{content}"),
            SessionEvent::ToolExecuting { name, .. } => eprintln!("  -> {name}"),
            SessionEvent::ToolResult {
                name,
                result,
                is_error: true,
                ..
            } => eprintln!("  !! {name}: {}", first_line(result)),
            _ => {}
        }
    }
}

/// Console output plus `tracing` logs (shown with `--verbose`).
pub fn event_handlers() -> CompositeEventHandler {
    CompositeEventHandler::new()
        .with(ConsoleHandler)
        .with(LoggingHandler)
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// Compose the system prompt for now, in the profile's zone when it names
/// a valid one and in the system zone otherwise.
pub fn compose_system_prompt(prefs: Option<&UserPreferences>, override_text: Option<&str>) -> String {
    let now_utc = Utc::now();
    let composer = PromptComposer::new();
    match prefs.and_then(UserPreferences::tz) {
        Some(tz) => composer.compose(&now_utc.with_timezone(&tz), &now_utc, prefs, override_text),
        None => composer.compose(&now_utc.with_timezone(&Local), &now_utc, prefs, override_text),
    }
}

/// Run `ask`: answer `prompt` (or a request read from the terminal), then
/// keep reading lines until an exit command, EOF or Ctrl-C.
pub async fn run(config: &AgentConfig, prompt: Option<String>) -> anyhow::Result<()> {
    let runtime = config.build_runtime()?;
    let tools = config.build_registry()?;
    let prefs = UserPreferences::load(&config.profile_path);
    let override_text = load_override(&config.system_prompt_path);
    let system = compose_system_prompt(prefs.as_ref(), override_text.as_deref());

    println!("{}", panel("Welcome", BANNER));
    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;

    let first = match prompt.filter(|p| !p.trim().is_empty()) {
        Some(p) => p,
        None => match editor.readline(&format!("You [{DEFAULT_REQUEST}]> ")) {
            Ok(line) if !line.trim().is_empty() => line,
            Ok(_) => DEFAULT_REQUEST.to_string(),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e).context("failed to read input"),
        },
    };

    let handler = event_handlers();
    let mut session = ConversationSession::new(&runtime, &tools, system)
        .with_config(config.build_session_config())
        .with_event_handler(&handler)
        .with_first_message(first);

    match session.answer_pending().await {
        Ok(Some(report)) => println!("{}", panel("Agent", &report.answer)),
        Ok(None) => {}
        Err(e) => eprintln!("Turn failed: {e}"),
    }

    loop {
        let line = match editor.readline("You (type 'exit' to quit)> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }
        match session.submit(&line).await {
            Ok(SubmitOutcome::Answered(report)) => println!("{}", panel("Agent", &report.answer)),
            Ok(SubmitOutcome::Ignored) => continue,
            Ok(SubmitOutcome::Terminated) => break,
            Err(e) => eprintln!("Turn failed: {e}"),
        }
    }

    info!("Session ended after {} message(s)", session.history().len());
    Ok(())
}
