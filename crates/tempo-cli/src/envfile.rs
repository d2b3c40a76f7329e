//! Persisting settings to a `.env` file.

use anyhow::Context;
use std::path::Path;

pub const ENV_FILE: &str = ".env";

/// Set `KEY=value` lines in the file at `path`, replacing existing
/// assignments of the same keys and appending new ones. Other lines are
/// kept as they are. The file is created if missing.
pub fn upsert(path: &Path, entries: &[(&str, &str)]) -> anyhow::Result<()> {
    let existing = if path.exists() {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    } else {
        String::new()
    };
    let updated = upsert_str(&existing, entries);
    std::fs::write(path, updated).with_context(|| format!("failed to write {}", path.display()))
}

/// [`upsert`] on file contents.
pub fn upsert_str(contents: &str, entries: &[(&str, &str)]) -> String {
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    for (key, value) in entries {
        let assignment = format!("{key}={}", quote(value));
        match lines.iter().position(|l| assigned_key(l) == Some(*key)) {
            Some(i) => lines[i] = assignment,
            None => lines.push(assignment),
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn assigned_key(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    line.split_once('=').map(|(k, _)| k.trim())
}

fn quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@+".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
